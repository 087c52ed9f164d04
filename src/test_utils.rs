//! Test utilities: synthetic frames, scripted collaborators and a mock transport
//!
//! Compiled for unit tests and for the `benchmark` feature so benches and
//! integration tests can drive the pipeline without a camera or a server.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::scheduler::CaptureScheduler;
use crate::source::{FrameSource, MotionSource, PoseSource, StatusSink};
use crate::transport::Transport;
use crate::types::{FrameSample, LinkStatus, MotionSnapshot, TrackedKeypoint};
use crate::{Result, UplinkError};

/// RGB frame with enough texture that JPEG quality changes the output size
pub fn gradient_frame(width: u32, height: u32) -> FrameSample {
    let mut sample = FrameSample::blank(width, height);
    fill_pattern(&mut sample, 0);
    sample
}

fn fill_pattern(sample: &mut FrameSample, seed: u32) {
    let width = sample.width.max(1);
    for (i, pixel) in sample.pixels.chunks_exact_mut(3).enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        pixel[0] = (x.wrapping_mul(255) / width) as u8;
        pixel[1] = ((x ^ y).wrapping_add(seed).wrapping_mul(37) % 256) as u8;
        pixel[2] = ((x * 7 + y * 13 + seed) % 256) as u8;
    }
}

/// Drive every queued network operation to completion, including the ones
/// queued by completions (a threshold trip queues a probe)
pub async fn run_pending(scheduler: &mut CaptureScheduler) {
    loop {
        let pending = scheduler.take_pending();
        if pending.is_empty() {
            break;
        }
        for completion in futures::future::join_all(pending).await {
            scheduler.complete(completion);
        }
    }
}

/// Scripted response of the mock transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Status(u16),
    /// Never answers; only a timeout ends the request
    Hang,
    /// Fails like a refused TCP connection
    Refused,
}

/// One recorded POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub url: String,
    pub body: Vec<u8>,
}

/// In-memory transport answering from per-method scripts, 200 once a script runs dry
#[derive(Debug, Default)]
pub struct MockTransport {
    post_replies: Mutex<VecDeque<Reply>>,
    get_replies: Mutex<VecDeque<Reply>>,
    posts: Mutex<Vec<PostRecord>>,
    gets: Mutex<Vec<String>>,
    discard_bodies: bool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport that records URLs but drops request bodies, for long benches
    pub fn discarding() -> Arc<Self> {
        Arc::new(Self { discard_bodies: true, ..Self::default() })
    }

    pub fn script_posts(&self, replies: impl IntoIterator<Item = Reply>) {
        self.post_replies.lock().unwrap().extend(replies);
    }

    pub fn script_gets(&self, replies: impl IntoIterator<Item = Reply>) {
        self.get_replies.lock().unwrap().extend(replies);
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        self.posts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    async fn answer(url: &str, reply: Option<Reply>) -> Result<u16> {
        match reply.unwrap_or(Reply::Status(200)) {
            Reply::Status(status) => Ok(status),
            Reply::Refused => Err(UplinkError::network(url, "connection refused")),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16> {
        let body = if self.discard_bodies { Vec::new() } else { body };
        self.posts.lock().unwrap().push(PostRecord { url: url.to_string(), body });
        let reply = self.post_replies.lock().unwrap().pop_front();
        Self::answer(url, reply).await
    }

    async fn get(&self, url: &str) -> Result<u16> {
        self.gets.lock().unwrap().push(url.to_string());
        let reply = self.get_replies.lock().unwrap().pop_front();
        Self::answer(url, reply).await
    }
}

#[derive(Debug, Default)]
struct FrameScript {
    dimensions: Option<(u32, u32)>,
    /// Overrides the buffer length written on read, to simulate a broken source
    fill_len: Option<usize>,
    reads: usize,
}

/// Frame source whose dimensions can be changed from the test while the
/// scheduler owns a clone
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrames {
    script: Arc<Mutex<FrameScript>>,
}

impl ScriptedFrames {
    pub fn new(width: u32, height: u32) -> Self {
        let frames = Self::default();
        frames.set_dimensions(Some((width, height)));
        frames
    }

    /// Source with no frame available yet
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_dimensions(&self, dimensions: Option<(u32, u32)>) {
        self.script.lock().unwrap().dimensions = dimensions;
    }

    pub fn set_fill_len(&self, len: Option<usize>) {
        self.script.lock().unwrap().fill_len = len;
    }

    pub fn reads(&self) -> usize {
        self.script.lock().unwrap().reads
    }
}

impl FrameSource for ScriptedFrames {
    fn frame_dimensions(&self) -> Option<(u32, u32)> {
        self.script.lock().unwrap().dimensions
    }

    fn read_frame(&mut self, sample: &mut FrameSample) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.reads += 1;

        let len = script
            .fill_len
            .unwrap_or_else(|| FrameSample::expected_len(sample.width, sample.height));
        sample.pixels.resize(len, 0);
        if script.fill_len.is_none() {
            fill_pattern(sample, script.reads as u32);
        }
        sample.timestamp_ms = script.reads as u64 * 14;
        Ok(())
    }
}

/// Pose source serving a fixed keypoint list; `None` entries are empty slots
#[derive(Debug, Clone)]
pub struct ScriptedPose {
    keypoints: Arc<Vec<Option<TrackedKeypoint>>>,
    active: Arc<AtomicBool>,
}

impl ScriptedPose {
    pub fn new(keypoints: Vec<Option<TrackedKeypoint>>) -> Self {
        Self { keypoints: Arc::new(keypoints), active: Arc::new(AtomicBool::new(true)) }
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl PoseSource for ScriptedPose {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }

    fn keypoint(&self, index: usize) -> Option<TrackedKeypoint> {
        self.keypoints.get(index).copied().flatten()
    }
}

/// Motion source returning the same snapshot every cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMotion(pub MotionSnapshot);

impl MotionSource for StaticMotion {
    fn snapshot(&self) -> Option<MotionSnapshot> {
        Some(self.0)
    }
}

/// Status sink keeping every published status
#[derive(Debug, Clone, Default)]
pub struct RecordingStatusSink {
    statuses: Arc<Mutex<Vec<LinkStatus>>>,
    publishes: Arc<AtomicUsize>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<LinkStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

impl StatusSink for RecordingStatusSink {
    fn publish(&mut self, status: &LinkStatus) {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().push(status.clone());
    }
}
