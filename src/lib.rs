//! Capture-and-uplink pipeline for headset camera frames and body pose.
//!
//! Framecast samples a camera frame and a body-pose snapshot at a configured
//! cadence, compresses the frame to JPEG (optionally downscaled), packs it
//! with the pose keypoints, a game-state label and headset/hand transforms
//! into a JSON payload, and POSTs it to a processing server. Connection
//! health is tracked from send results and probes and reported as a status
//! line for an overlay.
//!
//! # Features
//!
//! - **Single-flight capture**: at most one payload in flight; overlapping
//!   cycles are dropped, never queued
//! - **Interval or discrete triggering**: fixed send interval, or external
//!   triggers with a cooldown
//! - **Failure-driven reprobing**: consecutive send failures mark the link
//!   down and probe the server until it answers again
//! - **Non-blocking**: network work runs beside the tick loop, bounded by a
//!   per-request timeout
//!
//! # Example
//!
//! ```rust,no_run
//! use framecast::{CaptureSources, Framecast, GameStateSequencer, UplinkConfig};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> framecast::Result<()> {
//!     let config = UplinkConfig::load("framecast.yaml")?;
//!     let sources = CaptureSources::new().with_game_state(GameStateSequencer::default());
//!
//!     let connection = Framecast::start(config, sources)?;
//!     let mut updates = connection.status_updates();
//!     while let Some(status) = updates.next().await {
//!         println!("{}", status.message);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

// Core types and error handling
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Pipeline stages
pub mod encoder;
pub mod game_state;
pub mod health;
pub mod payload;
pub mod source;
pub mod transport;
pub mod uplink;

// Task architecture
pub mod connection;
pub mod driver;
pub mod scheduler;

// Core exports
pub use config::UplinkConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use connection::UplinkConnection;
pub use encoder::{EncodedImage, ImageEncoder};
pub use game_state::GameStateSequencer;
pub use health::HealthProbe;
pub use payload::{PayloadBuilder, UplinkPayload};
pub use scheduler::{CaptureScheduler, Completion, CycleOutcome};
pub use source::{CaptureSources, FrameSource, GameStateSource, MotionSource, PoseSource, StatusSink};
pub use transport::{HttpTransport, Transport};
pub use uplink::{Ack, SendVerdict, UplinkClient};

/// Entry point starting a capture pipeline
///
/// Every constructor validates the configuration and spawns the capture task
/// on the current tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use framecast::{CaptureSources, Framecast, UplinkConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> framecast::Result<()> {
///     let connection = Framecast::start(UplinkConfig::default(), CaptureSources::new())?;
///     println!("{}", connection.overlay_text());
///     Ok(())
/// }
/// ```
pub struct Framecast;

impl Framecast {
    /// Start uplinking to the configured server over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration fails validation
    /// - The HTTP client cannot be built
    pub fn start(config: UplinkConfig, sources: CaptureSources) -> Result<UplinkConnection> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout())?;
        Self::start_with_transport(config, sources, Arc::new(transport))
    }

    /// Start uplinking over a caller-supplied transport.
    pub fn start_with_transport(
        config: UplinkConfig,
        sources: CaptureSources,
        transport: Arc<dyn Transport>,
    ) -> Result<UplinkConnection> {
        config.validate()?;
        Ok(UplinkConnection::spawn(&config, sources, transport, None))
    }

    /// Start uplinking and publish every status change to `sink`.
    pub fn start_with_sink(
        config: UplinkConfig,
        sources: CaptureSources,
        transport: Arc<dyn Transport>,
        sink: impl StatusSink + 'static,
    ) -> Result<UplinkConnection> {
        config.validate()?;
        Ok(UplinkConnection::spawn(&config, sources, transport, Some(Box::new(sink))))
    }
}
