//! Running uplink connection

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::UplinkConfig;
use crate::driver::Driver;
use crate::scheduler::CaptureScheduler;
use crate::source::{CaptureSources, StatusSink};
use crate::transport::Transport;
use crate::types::{LinkStatus, TriggerMode};


/// Handle to a running capture pipeline
///
/// Dropping the handle cancels the capture task. Sends still in flight at
/// that point are abandoned.
pub struct UplinkConnection {
    /// Status watch receiver
    status: watch::Receiver<LinkStatus>,

    /// Discrete trigger sender
    triggers: mpsc::Sender<()>,

    /// Cancellation token for stopping the task
    cancel: CancellationToken,

    host: String,
    port: u16,
    mode: TriggerMode,
}

impl UplinkConnection {
    pub(crate) fn spawn(
        config: &UplinkConfig,
        sources: CaptureSources,
        transport: Arc<dyn Transport>,
        sink: Option<Box<dyn StatusSink>>,
    ) -> Self {
        let mut scheduler = CaptureScheduler::new(config, sources, transport);
        if let Some(sink) = sink {
            scheduler = scheduler.with_boxed_status_sink(sink);
        }

        let channels = Driver::spawn(scheduler, config.tick_period());
        info!(
            "Uplink to {}:{} started in {:?} mode",
            config.server.host, config.server.port, config.capture.mode
        );

        Self {
            status: channels.status,
            triggers: channels.triggers,
            cancel: channels.cancel,
            host: config.server.host.clone(),
            port: config.server.port,
            mode: config.capture.mode,
        }
    }

    /// Current connection status
    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    /// Status as overlay text, e.g. `Server: 10.0.55.172:5000 | Frames sent: 12`
    pub fn overlay_text(&self) -> String {
        self.status.borrow().overlay_text(&self.host, self.port)
    }

    /// Status changes as a stream
    ///
    /// Yields the current status immediately, then every change. Intermediate
    /// values may be skipped if the consumer falls behind; the latest is
    /// always delivered.
    pub fn status_updates(&self) -> impl Stream<Item = LinkStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    /// Request a capture in discrete mode
    ///
    /// Returns `false` when the trigger was dropped because one is already
    /// pending or the task has stopped. Cooldown filtering happens in the
    /// capture task.
    pub fn trigger(&self) -> bool {
        self.triggers.try_send(()).is_ok()
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Whether the capture task is still running
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.triggers.is_closed()
    }

    /// Stop the capture task
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for UplinkConnection {
    fn drop(&mut self) {
        debug!("Dropping uplink connection");
        self.cancel.cancel();
    }
}
