//! Connection health state

use serde::Serialize;

/// Where the link to the processing server stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkPhase {
    /// No probe has resolved yet
    Unknown,
    /// Last probe or send succeeded
    Connected,
    /// A probe failed or the send failure threshold tripped
    Disconnected,
}

/// What the status sink is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub connected: bool,
    pub message: String,
}

impl LinkStatus {
    /// One-line overlay text for the given server address
    pub fn overlay_text(&self, host: &str, port: u16) -> String {
        if self.connected {
            format!("Server: {}:{} | {}", host, port, self.message)
        } else {
            format!("Server disconnected: {}:{}", host, port)
        }
    }
}

/// Connection health shared by the uplink client and the health probe
///
/// Owned by the capture scheduler and mutated only from its task, so it
/// needs no synchronization.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    phase: LinkPhase,
    consecutive_failures: u32,
    frames_sent: u64,
    message: String,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            phase: LinkPhase::Unknown,
            consecutive_failures: 0,
            frames_sent: 0,
            message: "Connecting".to_string(),
        }
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == LinkPhase::Connected
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Monotonic count of delivered frames
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus { connected: self.is_connected(), message: self.message.clone() }
    }

    /// Record a successful send; returns the new sent-frame count
    pub(crate) fn record_delivery(&mut self) -> u64 {
        self.frames_sent += 1;
        self.consecutive_failures = 0;
        self.phase = LinkPhase::Connected;
        self.message = format!("Frames sent: {}", self.frames_sent);
        self.frames_sent
    }

    /// Record a failed send; returns the new consecutive failure count
    pub(crate) fn record_failure(&mut self, message: String) -> u32 {
        self.consecutive_failures += 1;
        self.message = message;
        self.consecutive_failures
    }

    /// Drop to disconnected and clear the failure counter
    pub(crate) fn trip(&mut self) {
        self.phase = LinkPhase::Disconnected;
        self.consecutive_failures = 0;
    }

    /// Apply a probe result, last write wins
    pub(crate) fn record_probe(&mut self, reachable: bool) {
        if reachable {
            self.phase = LinkPhase::Connected;
            self.message = "Server connected".to_string();
        } else {
            self.phase = LinkPhase::Disconnected;
            self.message = "Server disconnected".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_not_connected() {
        let state = ConnectionState::new();
        assert_eq!(state.phase(), LinkPhase::Unknown);
        assert!(!state.is_connected());
        assert_eq!(state.frames_sent(), 0);
    }

    #[test]
    fn delivery_connects_and_clears_failures() {
        let mut state = ConnectionState::new();
        state.record_failure("Send error: refused".into());
        state.record_failure("Send error: refused".into());
        assert_eq!(state.consecutive_failures(), 2);

        assert_eq!(state.record_delivery(), 1);
        assert!(state.is_connected());
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.message(), "Frames sent: 1");
    }

    #[test]
    fn trip_disconnects_and_resets_counter() {
        let mut state = ConnectionState::new();
        state.record_probe(true);
        state.record_failure("x".into());
        state.trip();
        assert_eq!(state.phase(), LinkPhase::Disconnected);
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[test]
    fn overlay_text_reflects_connection() {
        let up = LinkStatus { connected: true, message: "Frames sent: 12".into() };
        let down = LinkStatus { connected: false, message: "Server disconnected".into() };

        assert_eq!(up.overlay_text("10.0.55.172", 5000), "Server: 10.0.55.172:5000 | Frames sent: 12");
        assert_eq!(down.overlay_text("10.0.55.172", 5000), "Server disconnected: 10.0.55.172:5000");
    }
}
