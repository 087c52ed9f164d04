//! Core data types for the capture-and-uplink pipeline.
//!
//! ## Overview
//!
//! - [`FrameSample`] is a raw camera frame, packed row-major RGB
//! - [`PoseSnapshot`] holds ordered [`KeypointRecord`]s from the pose source
//! - [`MotionSnapshot`] holds headset and hand transforms sampled at send time
//! - [`ConnectionState`] tracks link health, failures and delivered frames
//! - [`TriggerMode`] selects interval-driven or event-driven capture
//!
//! Pose and motion types serialize to the JSON layout the processing server
//! consumes; see [`crate::payload`] for the full payload.
//!
//! ```rust
//! use framecast::types::{KeypointRecord, PoseSnapshot, Vec3};
//!
//! let pose = PoseSnapshot::new(vec![KeypointRecord::new(0, Vec3::new(0.1, 1.7, 0.4), true)]);
//! let json = serde_json::to_string(&pose).unwrap();
//! assert!(json.starts_with(r#"{"keypoints":[{"index":0"#));
//! ```

mod frame;
mod link;
mod motion;
mod pose;
mod trigger;

pub use frame::{FrameSample, RGB_CHANNELS};
pub use link::{ConnectionState, LinkPhase, LinkStatus};
pub use motion::{MotionSnapshot, Pose3, Quat};
pub use pose::{KeypointRecord, PoseSnapshot, TrackedKeypoint, Vec3};
pub use trigger::TriggerMode;
