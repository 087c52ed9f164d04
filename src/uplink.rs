//! Payload delivery and failure accounting

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::Instant;
use tracing::{error, info, trace, warn};

use crate::payload::UplinkPayload;
use crate::transport::{Transport, is_success};
use crate::types::ConnectionState;
use crate::{Result, UplinkError};

/// Default number of consecutive failures before the link is reprobed
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Server acknowledgement of one delivered payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    /// Request body size
    pub bytes: usize,
    pub latency: Duration,
}

/// What a send result did to the connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendVerdict {
    Delivered { frames_sent: u64 },
    /// Counted failure, link state unchanged
    Failed { consecutive: u32 },
    /// Threshold reached while connected: link marked down, a probe is due
    Tripped,
    /// Not a transport failure (payload could not be serialized); not counted
    Dropped,
}

/// Sends payloads to the frame endpoint
///
/// [`send`](Self::send) hands back a `'static` future so the caller's loop is
/// never blocked on the network; the result is folded into the connection
/// state afterwards with [`record`](Self::record). Payloads are never retried.
pub struct UplinkClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    timeout: Duration,
    failure_threshold: u32,
    log_successes: bool,
}

impl UplinkClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        timeout: Duration,
        failure_threshold: u32,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            timeout,
            failure_threshold: failure_threshold.max(1),
            log_successes: false,
        }
    }

    /// Log each delivered frame at info level
    pub fn with_success_logging(mut self, enabled: bool) -> Self {
        self.log_successes = enabled;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Serialize and POST a payload
    ///
    /// Serialization happens before this returns; the network round-trip
    /// happens when the future is polled and is bounded by the timeout.
    pub fn send(&self, payload: &UplinkPayload) -> BoxFuture<'static, Result<Ack>> {
        let body = payload.to_json();
        let transport = Arc::clone(&self.transport);
        let url = self.endpoint.clone();
        let timeout = self.timeout;

        async move {
            let body = body?;
            let bytes = body.len();
            let started = Instant::now();

            let status = match tokio::time::timeout(timeout, transport.post_json(&url, body)).await {
                Ok(result) => result?,
                Err(_) => return Err(UplinkError::Timeout { duration: timeout }),
            };
            if !is_success(status) {
                return Err(UplinkError::status(url, status));
            }

            Ok(Ack { status, bytes, latency: started.elapsed() })
        }
        .boxed()
    }

    /// Fold a send result into the connection state
    pub fn record(&self, result: &Result<Ack>, state: &mut ConnectionState) -> SendVerdict {
        match result {
            Ok(ack) => {
                let frames_sent = state.record_delivery();
                if self.log_successes {
                    info!(
                        "Frame {} delivered ({} bytes, {:?})",
                        frames_sent, ack.bytes, ack.latency
                    );
                } else {
                    trace!(frames_sent, bytes = ack.bytes, latency = ?ack.latency, "Frame delivered");
                }
                SendVerdict::Delivered { frames_sent }
            }
            Err(err) if err.is_send_failure() => {
                let was_connected = state.is_connected();
                let consecutive = state.record_failure(format!("Send error: {}", err));
                warn!("Send failed ({}/{}): {}", consecutive, self.failure_threshold, err);

                if consecutive >= self.failure_threshold && was_connected {
                    state.trip();
                    error!(
                        "{} consecutive send failures, marking link down and reprobing {}",
                        consecutive, self.endpoint
                    );
                    SendVerdict::Tripped
                } else {
                    SendVerdict::Failed { consecutive }
                }
            }
            Err(err) => {
                warn!("Payload dropped: {}", err);
                SendVerdict::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockTransport, Reply};
    use crate::types::LinkPhase;

    const URL: &str = "http://server:5000/api/frame";

    fn connected_state() -> ConnectionState {
        let mut state = ConnectionState::new();
        state.record_probe(true);
        state
    }

    fn payload() -> UplinkPayload {
        UplinkPayload { state: Some("Relax".into()), ..Default::default() }
    }

    #[tokio::test]
    async fn success_reports_ack_and_posts_json() {
        let transport = MockTransport::new();
        let client = UplinkClient::new(transport.clone(), URL, Duration::from_secs(5), 3);

        let ack = client.send(&payload()).await.unwrap();
        assert_eq!(ack.status, 200);

        let posts = transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, URL);
        assert_eq!(posts[0].body, br#"{"game_state":"Relax"}"#.to_vec());
        assert_eq!(ack.bytes, posts[0].body.len());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let transport = MockTransport::new();
        transport.script_posts([Reply::Status(503)]);
        let client = UplinkClient::new(transport, URL, Duration::from_secs(5), 3);

        let err = client.send(&payload()).await.unwrap_err();
        assert!(matches!(err, UplinkError::Status { status: 503, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out() {
        let transport = MockTransport::new();
        transport.script_posts([Reply::Hang]);
        let client = UplinkClient::new(transport, URL, Duration::from_millis(5000), 3);

        let err = client.send(&payload()).await.unwrap_err();
        assert!(matches!(err, UplinkError::Timeout { duration } if duration == Duration::from_millis(5000)));
    }

    #[test]
    fn success_resets_failures_and_counts_frames() {
        let client = UplinkClient::new(MockTransport::new(), URL, Duration::from_secs(5), 3);
        let mut state = connected_state();
        let ok = Ok(Ack { status: 200, bytes: 10, latency: Duration::ZERO });

        client.record(&Err(UplinkError::network(URL, "refused")), &mut state);
        assert_eq!(state.consecutive_failures(), 1);

        assert_eq!(client.record(&ok, &mut state), SendVerdict::Delivered { frames_sent: 1 });
        assert_eq!(client.record(&ok, &mut state), SendVerdict::Delivered { frames_sent: 2 });
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.message(), "Frames sent: 2");
    }

    #[test]
    fn threshold_trips_exactly_once() {
        let client = UplinkClient::new(MockTransport::new(), URL, Duration::from_secs(5), 3);
        let mut state = connected_state();
        let fail = || Err(UplinkError::network(URL, "refused"));

        assert_eq!(client.record(&fail(), &mut state), SendVerdict::Failed { consecutive: 1 });
        assert_eq!(client.record(&fail(), &mut state), SendVerdict::Failed { consecutive: 2 });
        assert!(state.is_connected(), "below threshold the link stays up");

        assert_eq!(client.record(&fail(), &mut state), SendVerdict::Tripped);
        assert_eq!(state.phase(), LinkPhase::Disconnected);
        assert_eq!(state.consecutive_failures(), 0);

        // Already down: further failures count but never trip again
        for expected in 1..=4 {
            assert_eq!(
                client.record(&fail(), &mut state),
                SendVerdict::Failed { consecutive: expected }
            );
        }
    }

    #[test]
    fn failure_message_names_the_error() {
        let client = UplinkClient::new(MockTransport::new(), URL, Duration::from_secs(5), 3);
        let mut state = connected_state();
        client.record(&Err(UplinkError::status(URL, 500)), &mut state);
        assert!(state.message().starts_with("Send error: "));
        assert!(state.message().contains("500"));
    }

    #[test]
    fn serialization_failures_are_not_counted() {
        let client = UplinkClient::new(MockTransport::new(), URL, Duration::from_secs(5), 1);
        let mut state = connected_state();
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert_eq!(client.record(&Err(json_err.into()), &mut state), SendVerdict::Dropped);
        assert_eq!(state.consecutive_failures(), 0);
        assert!(state.is_connected());
    }
}
