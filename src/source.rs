//! Collaborator traits for the data sources and the status display
//!
//! The host runtime owns the camera, the pose model, the game logic and the
//! tracked devices. The pipeline only polls them, once per capture cycle, from
//! the scheduler's task.

use crate::types::{FrameSample, LinkStatus, MotionSnapshot, TrackedKeypoint};
use crate::Result;

/// Live camera feed
pub trait FrameSource: Send {
    /// Dimensions of the current frame, or `None` while no frame is available
    fn frame_dimensions(&self) -> Option<(u32, u32)>;

    /// Copy the current frame into `sample`
    ///
    /// `sample` is already sized for the dimensions last reported by
    /// [`frame_dimensions`](Self::frame_dimensions); implementations fill
    /// `pixels` and set `timestamp_ms`.
    fn read_frame(&mut self, sample: &mut FrameSample) -> Result<()>;
}

/// Pose-estimation output
///
/// Keypoints are indexed by their position in the model's joint sequence;
/// slots may be empty when the model has no estimate for a joint.
pub trait PoseSource: Send {
    /// Whether the pose subsystem is running
    fn is_active(&self) -> bool;

    /// Number of joint slots
    fn keypoint_count(&self) -> usize;

    /// Joint at `index`, `None` for an empty slot
    fn keypoint(&self, index: usize) -> Option<TrackedKeypoint>;
}

/// Current game-state label
pub trait GameStateSource: Send {
    fn current_label(&self) -> Option<String>;
}

/// Headset and hand transforms
pub trait MotionSource: Send {
    fn snapshot(&self) -> Option<MotionSnapshot>;
}

/// Receiver of connection status, called once per change
pub trait StatusSink: Send {
    fn publish(&mut self, status: &LinkStatus);
}

impl<F> StatusSink for F
where
    F: FnMut(&LinkStatus) + Send,
{
    fn publish(&mut self, status: &LinkStatus) {
        self(status)
    }
}

/// Sources polled by the capture scheduler; any of them may be absent
#[derive(Default)]
pub struct CaptureSources {
    pub frames: Option<Box<dyn FrameSource>>,
    pub pose: Option<Box<dyn PoseSource>>,
    pub game_state: Option<Box<dyn GameStateSource>>,
    pub motion: Option<Box<dyn MotionSource>>,
}

impl CaptureSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(mut self, source: impl FrameSource + 'static) -> Self {
        self.frames = Some(Box::new(source));
        self
    }

    pub fn with_pose(mut self, source: impl PoseSource + 'static) -> Self {
        self.pose = Some(Box::new(source));
        self
    }

    pub fn with_game_state(mut self, source: impl GameStateSource + 'static) -> Self {
        self.game_state = Some(Box::new(source));
        self
    }

    pub fn with_motion(mut self, source: impl MotionSource + 'static) -> Self {
        self.motion = Some(Box::new(source));
        self
    }
}

impl std::fmt::Debug for CaptureSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSources")
            .field("frames", &self.frames.is_some())
            .field("pose", &self.pose.is_some())
            .field("game_state", &self.game_state.is_some())
            .field("motion", &self.motion.is_some())
            .finish()
    }
}
