//! Capture trigger modes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What starts a capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Capture whenever `interval` has elapsed since the last cycle started
    Interval,

    /// Capture on external trigger events, at most once per cooldown window
    Discrete,
}

impl TriggerMode {
    /// Pacing window for the mode: the send interval or the trigger cooldown
    pub fn window(self, send_interval: Duration, cooldown: Duration) -> Duration {
        match self {
            TriggerMode::Interval => send_interval,
            TriggerMode::Discrete => cooldown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_picks_mode_specific_duration() {
        let interval = Duration::from_millis(100);
        let cooldown = Duration::from_millis(500);
        assert_eq!(TriggerMode::Interval.window(interval, cooldown), interval);
        assert_eq!(TriggerMode::Discrete.window(interval, cooldown), cooldown);
    }

    #[test]
    fn deserializes_from_snake_case() {
        let mode: TriggerMode = serde_yaml_ng::from_str("discrete").unwrap();
        assert_eq!(mode, TriggerMode::Discrete);
    }
}
