//! Driver spawns and runs the capture task

use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::scheduler::{CaptureScheduler, CycleOutcome, Completion};
use crate::types::LinkStatus;

/// Triggers beyond this many unprocessed ones are dropped
const TRIGGER_QUEUE: usize = 1;

/// Shortest tick period the capture task runs at
const MIN_TICK: Duration = Duration::from_nanos(1);

/// Result of spawning the capture task
pub struct DriverChannels {
    /// Receiver for connection status changes
    pub status: watch::Receiver<LinkStatus>,
    /// Sender for discrete capture triggers
    pub triggers: mpsc::Sender<()>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// What woke the capture loop
enum LoopEvent {
    Tick(Instant),
    Trigger,
    TriggersClosed,
    Completed(Completion),
}

/// Driver spawns and manages the capture task
///
/// The task owns the [`CaptureScheduler`]. It ticks it at a fixed period,
/// forwards triggers, and polls the network operations the scheduler queues
/// so that sends and probes never block a tick.
pub struct Driver;

impl Driver {
    /// Spawn the capture task for `scheduler`, ticking every `tick_period`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(scheduler: CaptureScheduler, tick_period: Duration) -> DriverChannels {
        let (status_tx, status_rx) = watch::channel(scheduler.status());
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE);
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::capture_task(scheduler, tick_period, trigger_rx, status_tx, cancel_task).await;
        });

        DriverChannels { status: status_rx, triggers: trigger_tx, cancel }
    }

    /// Capture task - ticks the scheduler and applies network completions
    async fn capture_task(
        mut scheduler: CaptureScheduler,
        tick_period: Duration,
        mut triggers: mpsc::Receiver<()>,
        status_tx: watch::Sender<LinkStatus>,
        cancel: CancellationToken,
    ) {
        info!("Capture task started (tick every {:?})", tick_period);
        scheduler.start();

        let mut ticker = tokio::time::interval(tick_period.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick: Option<Instant> = None;
        let mut in_flight = FuturesUnordered::new();
        let mut triggers_open = true;

        loop {
            in_flight.extend(scheduler.take_pending());

            let status = scheduler.status();
            status_tx.send_if_modified(|current| {
                if *current == status {
                    return false;
                }
                *current = status;
                true
            });
            if status_tx.is_closed() {
                debug!("Status receivers dropped, shutting down");
                break;
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Capture task cancelled");
                    break;
                }
                now = ticker.tick() => LoopEvent::Tick(now),
                trigger = triggers.recv(), if triggers_open => match trigger {
                    Some(()) => LoopEvent::Trigger,
                    None => LoopEvent::TriggersClosed,
                },
                Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                    LoopEvent::Completed(completion)
                }
            };

            match event {
                LoopEvent::Tick(now) => {
                    let elapsed = last_tick.map_or(Duration::ZERO, |last| now - last);
                    last_tick = Some(now);
                    let outcome = scheduler.tick(elapsed);
                    trace!(?outcome, "Tick handled");
                }
                LoopEvent::Trigger => {
                    let outcome = scheduler.trigger();
                    if let CycleOutcome::Started(cycle) = outcome {
                        debug!(cycle, "Trigger started a capture");
                    } else {
                        debug!(?outcome, "Trigger did not start a capture");
                    }
                }
                LoopEvent::TriggersClosed => {
                    debug!("Trigger channel closed");
                    triggers_open = false;
                }
                LoopEvent::Completed(completion) => scheduler.complete(completion),
            }
        }

        info!(
            "Capture task ended ({} cycles, {} frames delivered, {} operations abandoned)",
            scheduler.cycles_started(),
            scheduler.state().frames_sent(),
            in_flight.len()
        );
    }
}
