//! Capture scheduling
//!
//! [`CaptureScheduler`] is a synchronous state machine. It decides when a
//! capture cycle is due, samples the sources, encodes and builds the payload,
//! then hands the network round-trip off as a `'static` future. Whoever owns
//! the scheduler (normally the [`Driver`](crate::driver::Driver)) polls those
//! futures and feeds their [`Completion`]s back through
//! [`complete`](CaptureScheduler::complete). Every mutation happens on the
//! owner's task, so the connection state needs no lock.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, error, info, trace};

use crate::config::UplinkConfig;
use crate::encoder::{EncodedImage, ImageEncoder};
use crate::health::HealthProbe;
use crate::payload::PayloadBuilder;
use crate::source::{CaptureSources, StatusSink};
use crate::transport::Transport;
use crate::types::{ConnectionState, FrameSample, KeypointRecord, LinkStatus, PoseSnapshot, TriggerMode};
use crate::uplink::{Ack, SendVerdict, UplinkClient};
use crate::{Result, UplinkError};

/// What a tick or trigger did
#[derive(Debug)]
pub enum CycleOutcome {
    /// The interval has not elapsed, or the trigger fell inside the cooldown
    NotDue,
    /// A send is still in flight
    Busy,
    /// The link is not connected
    Offline,
    /// An image is wanted but the frame source has no frame yet
    NoSample,
    /// Nothing worth sending: no image and no pose
    Skipped,
    /// Sampling or encoding failed; nothing was sent
    Aborted(UplinkError),
    /// A payload was dispatched under this cycle id
    Started(u64),
}

impl CycleOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, CycleOutcome::Started(_))
    }
}

/// Result of a network operation queued by the scheduler
#[derive(Debug)]
pub enum Completion {
    Sent { cycle: u64, result: Result<Ack> },
    Probed { result: Result<()> },
}

/// Options copied out of [`UplinkConfig`] at construction
#[derive(Debug, Clone, Copy)]
struct CaptureOptions {
    mode: TriggerMode,
    window: Duration,
    include_image: bool,
    only_active_keypoints: bool,
    send_empty_pose: bool,
    reprobe_interval: Option<Duration>,
}

/// Tick-driven capture loop with single-flight sends
pub struct CaptureScheduler {
    options: CaptureOptions,
    encoder: ImageEncoder,
    uplink: UplinkClient,
    probe: HealthProbe,
    sources: CaptureSources,
    sink: Option<Box<dyn StatusSink>>,
    state: ConnectionState,

    /// Reusable frame buffer, sized for the last reported dimensions
    frame: Option<FrameSample>,
    frame_allocations: u64,
    /// Downscale destination, released together with `frame` on resize
    scaled: Vec<u8>,

    /// Interval mode: time accumulated since the last cycle
    since_cycle: Duration,
    /// Discrete mode: time since the last honored trigger, `None` before the first
    since_trigger: Option<Duration>,
    since_probe: Duration,

    started: bool,
    in_flight: Option<u64>,
    probes_outstanding: u32,
    cycles: u64,
    pending: Vec<BoxFuture<'static, Completion>>,
    published: Option<LinkStatus>,
}

impl CaptureScheduler {
    /// Build a scheduler from a validated configuration
    pub fn new(config: &UplinkConfig, sources: CaptureSources, transport: Arc<dyn Transport>) -> Self {
        let capture = &config.capture;
        let options = CaptureOptions {
            mode: capture.mode,
            window: capture.mode.window(config.send_interval(), config.trigger_cooldown()),
            include_image: capture.include_image,
            only_active_keypoints: capture.only_active_keypoints,
            send_empty_pose: capture.send_empty_pose,
            reprobe_interval: config.reprobe_interval(),
        };

        let uplink = UplinkClient::new(
            Arc::clone(&transport),
            config.frame_url(),
            config.timeout(),
            config.link.failure_threshold,
        )
        .with_success_logging(config.logging.log_successes);
        let probe = HealthProbe::new(transport, config.ping_url(), config.timeout());

        Self {
            options,
            encoder: ImageEncoder::new(capture.jpeg_quality, config.max_dimension()),
            uplink,
            probe,
            sources,
            sink: None,
            state: ConnectionState::new(),
            frame: None,
            frame_allocations: 0,
            scaled: Vec::new(),
            since_cycle: Duration::ZERO,
            since_trigger: None,
            since_probe: Duration::ZERO,
            started: false,
            in_flight: None,
            probes_outstanding: 0,
            cycles: 0,
            pending: Vec::new(),
            published: None,
        }
    }

    /// Receive a status update on every connection state change
    pub fn with_status_sink(self, sink: impl StatusSink + 'static) -> Self {
        self.with_boxed_status_sink(Box::new(sink))
    }

    pub(crate) fn with_boxed_status_sink(mut self, sink: Box<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Queue the startup probe and publish the initial status
    ///
    /// No cycle runs before the probe resolves connected. Calling it again is
    /// a no-op.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            "Capture scheduler started ({:?} mode, window {:?}), probing {}",
            self.options.mode,
            self.options.window,
            self.probe.url()
        );
        self.publish_if_changed();
        self.queue_probe();
    }

    /// Advance the scheduler clock by `elapsed`
    ///
    /// In interval mode this may start a cycle. In discrete mode it only
    /// advances the cooldown and returns [`CycleOutcome::NotDue`].
    pub fn tick(&mut self, elapsed: Duration) -> CycleOutcome {
        trace!(?elapsed, "tick");
        self.advance_reprobe(elapsed);

        match self.options.mode {
            TriggerMode::Interval => {
                self.since_cycle = self.since_cycle.saturating_add(elapsed);
                if self.since_cycle < self.options.window {
                    return CycleOutcome::NotDue;
                }
                let outcome = self.run_cycle();
                if matches!(outcome, CycleOutcome::Started(_) | CycleOutcome::Aborted(_)) {
                    self.since_cycle = Duration::ZERO;
                }
                outcome
            }
            TriggerMode::Discrete => {
                if let Some(since) = self.since_trigger.as_mut() {
                    *since = since.saturating_add(elapsed);
                }
                CycleOutcome::NotDue
            }
        }
    }

    /// External capture trigger
    ///
    /// Honored in discrete mode only, and at most once per cooldown window.
    /// Ignored triggers are dropped, never buffered.
    pub fn trigger(&mut self) -> CycleOutcome {
        if self.options.mode != TriggerMode::Discrete {
            debug!("Trigger ignored in interval mode");
            return CycleOutcome::NotDue;
        }
        if self.since_trigger.is_some_and(|since| since < self.options.window) {
            debug!("Trigger ignored inside cooldown window");
            return CycleOutcome::NotDue;
        }

        let outcome = self.run_cycle();
        if matches!(outcome, CycleOutcome::Started(_) | CycleOutcome::Aborted(_)) {
            self.since_trigger = Some(Duration::ZERO);
        }
        outcome
    }

    /// Network operations queued since the last call
    pub fn take_pending(&mut self) -> Vec<BoxFuture<'static, Completion>> {
        std::mem::take(&mut self.pending)
    }

    /// Apply the result of a queued network operation
    pub fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Sent { cycle, result } => {
                if self.in_flight == Some(cycle) {
                    self.in_flight = None;
                }
                if let SendVerdict::Tripped = self.uplink.record(&result, &mut self.state) {
                    self.queue_probe();
                }
            }
            Completion::Probed { result } => {
                self.probes_outstanding = self.probes_outstanding.saturating_sub(1);
                self.probe.apply(&result, &mut self.state);
            }
        }
        self.publish_if_changed();
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn status(&self) -> LinkStatus {
        self.state.status()
    }

    pub fn mode(&self) -> TriggerMode {
        self.options.mode
    }

    /// Cycle id of the outstanding send, if any
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn probes_outstanding(&self) -> u32 {
        self.probes_outstanding
    }

    /// Number of cycles dispatched so far
    pub fn cycles_started(&self) -> u64 {
        self.cycles
    }

    /// The reusable frame buffer, once a frame has been read
    pub fn frame_buffer(&self) -> Option<&FrameSample> {
        self.frame.as_ref()
    }

    /// How many times the frame buffer has been (re)allocated
    pub fn frame_allocations(&self) -> u64 {
        self.frame_allocations
    }

    /// Pixels of the last downscaled frame, empty when no resize happened
    pub fn scaled_buffer(&self) -> &[u8] {
        &self.scaled
    }

    fn run_cycle(&mut self) -> CycleOutcome {
        if let Some(cycle) = self.in_flight {
            debug!(cycle, "Capture skipped, send in flight");
            return CycleOutcome::Busy;
        }
        if !self.state.is_connected() {
            debug!(phase = ?self.state.phase(), "Capture skipped, link not connected");
            return CycleOutcome::Offline;
        }

        let wants_image = self.options.include_image && self.sources.frames.is_some();
        let pose = self.sample_pose();
        let image = if wants_image {
            match self.capture_image() {
                Ok(Some(image)) => Some(image),
                Ok(None) => {
                    debug!("Capture skipped, no camera frame yet");
                    return CycleOutcome::NoSample;
                }
                Err(err) => {
                    error!("Capture aborted: {}", err);
                    return CycleOutcome::Aborted(err);
                }
            }
        } else {
            None
        };

        let state = self.sources.game_state.as_ref().and_then(|s| s.current_label());
        let motion = self.sources.motion.as_ref().and_then(|s| s.snapshot()).filter(|m| {
            if !m.is_finite() {
                debug!("Motion snapshot has non-finite values, leaving it out");
            }
            m.is_finite()
        });
        let payload = PayloadBuilder::build(image.as_ref(), pose, state, motion);
        if !payload.is_send_worthy() {
            debug!("Capture skipped, nothing to send");
            return CycleOutcome::Skipped;
        }

        self.cycles += 1;
        let cycle = self.cycles;
        self.in_flight = Some(cycle);
        debug!(
            cycle,
            image_bytes = image.as_ref().map_or(0, EncodedImage::len),
            keypoints = payload.pose.as_ref().map_or(0, PoseSnapshot::len),
            active_keypoints = payload.pose.as_ref().map_or(0, PoseSnapshot::active_count),
            "Capture cycle dispatched"
        );

        let send = self.uplink.send(&payload);
        self.pending.push(send.map(move |result| Completion::Sent { cycle, result }).boxed());
        CycleOutcome::Started(cycle)
    }

    /// Read the current frame into the reusable buffer and encode it
    fn capture_image(&mut self) -> Result<Option<EncodedImage>> {
        let Some(frames) = self.sources.frames.as_mut() else {
            return Ok(None);
        };
        let Some((width, height)) = frames.frame_dimensions() else {
            return Ok(None);
        };

        if self.frame.as_ref().is_some_and(|f| !f.has_dimensions(width, height)) {
            debug!("Frame source resized to {}x{}, reallocating buffer", width, height);
            self.frame = None;
            self.scaled = Vec::new();
        }
        let sample = self.frame.get_or_insert_with(|| {
            self.frame_allocations += 1;
            FrameSample::blank(width, height)
        });

        frames.read_frame(sample)?;
        self.encoder.encode_with_scratch(sample, &mut self.scaled).map(Some)
    }

    fn sample_pose(&self) -> Option<PoseSnapshot> {
        let source = self.sources.pose.as_ref().filter(|p| p.is_active())?;

        let keypoints: Vec<KeypointRecord> = (0..source.keypoint_count())
            .filter_map(|index| source.keypoint(index).map(|k| (index, k)))
            .filter(|(_, k)| k.active || !self.options.only_active_keypoints)
            .filter(|(index, k)| {
                if !k.position.is_finite() {
                    trace!(index, "Dropping keypoint with non-finite position");
                }
                k.position.is_finite()
            })
            .map(|(index, k)| KeypointRecord::new(index as u32, k.position, k.active))
            .collect();

        if keypoints.is_empty() && !self.options.send_empty_pose {
            return None;
        }
        Some(PoseSnapshot::new(keypoints))
    }

    fn advance_reprobe(&mut self, elapsed: Duration) {
        let Some(interval) = self.options.reprobe_interval else {
            return;
        };
        if !self.started || self.state.is_connected() || self.probes_outstanding > 0 {
            self.since_probe = Duration::ZERO;
            return;
        }

        self.since_probe = self.since_probe.saturating_add(elapsed);
        if self.since_probe >= interval {
            debug!("Link still down after {:?}, reprobing", self.since_probe);
            self.queue_probe();
        }
    }

    fn queue_probe(&mut self) {
        self.probes_outstanding += 1;
        self.since_probe = Duration::ZERO;
        let probe = self.probe.probe();
        self.pending.push(probe.map(|result| Completion::Probed { result }).boxed());
    }

    fn publish_if_changed(&mut self) {
        let status = self.state.status();
        if self.published.as_ref() == Some(&status) {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&status);
        }
        self.published = Some(status);
    }
}
