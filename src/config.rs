//! Configuration surface
//!
//! Configuration is read from YAML. Every field has a default, so an empty
//! document is a valid configuration pointing at the stock server address.
//!
//! ```yaml
//! server:
//!   host: 10.0.55.172
//!   port: 5000
//!   frame_path: /api/frame
//!   ping_path: /api/ping
//!   timeout_ms: 5000
//! capture:
//!   mode: interval          # or `discrete`
//!   send_interval_secs: 0.1
//!   trigger_cooldown_secs: 0.5
//!   jpeg_quality: 75
//!   max_dimension: 0        # 0 keeps the source resolution
//!   include_image: true
//!   only_active_keypoints: false
//!   send_empty_pose: true
//!   tick_hz: 72.0
//! link:
//!   failure_threshold: 3
//!   reprobe_interval_secs: 2.0   # 0 disables periodic reprobe
//! logging:
//!   log_successes: false
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::TriggerMode;
use crate::{Result, UplinkError};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UplinkConfig {
    pub server: ServerConfig,
    pub capture: CaptureConfig,
    pub link: LinkConfig,
    pub logging: LoggingConfig,
}

/// Remote processing server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route receiving the JSON payloads
    pub frame_path: String,
    /// Route answering reachability checks
    pub ping_path: String,
    /// Per-request timeout for sends and probes
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "10.0.55.172".to_string(),
            port: 5000,
            frame_path: "/api/frame".to_string(),
            ping_path: "/api/ping".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Capture cadence and encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub mode: TriggerMode,
    pub send_interval_secs: f64,
    pub trigger_cooldown_secs: f64,
    /// JPEG quality, 0-100
    pub jpeg_quality: u8,
    /// Bound on the larger image dimension; 0 disables resizing
    pub max_dimension: u32,
    /// Attach the camera frame to payloads
    pub include_image: bool,
    /// Drop inactive keypoints before sending
    pub only_active_keypoints: bool,
    /// Send `[]` when the pose source is active but tracks nothing
    pub send_empty_pose: bool,
    /// Rate at which the driver ticks the scheduler
    pub tick_hz: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Interval,
            send_interval_secs: 0.1,
            trigger_cooldown_secs: 0.5,
            jpeg_quality: 75,
            max_dimension: 0,
            include_image: true,
            only_active_keypoints: false,
            send_empty_pose: true,
            tick_hz: 72.0,
        }
    }
}

/// Connection health policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Consecutive send failures that mark the link down and trigger a reprobe
    pub failure_threshold: u32,
    /// Probe period while disconnected; 0 disables
    pub reprobe_interval_secs: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { failure_threshold: 3, reprobe_interval_secs: 2.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log every delivered frame at info level instead of trace
    pub log_successes: bool,
}

impl UplinkConfig {
    /// Load and validate a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| UplinkError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded config from {} ({} bytes)", path.display(), content.len());
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: UplinkConfig =
            if yaml.trim().is_empty() { Self::default() } else { serde_yaml_ng::from_str(yaml)? };
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.host.trim().is_empty() {
            return Err(UplinkError::config("server.host", "must not be empty"));
        }
        if server.port == 0 {
            return Err(UplinkError::config("server.port", "must be non-zero"));
        }
        if server.timeout_ms == 0 {
            return Err(UplinkError::config("server.timeout_ms", "must be non-zero"));
        }
        for (field, path) in
            [("server.frame_path", &server.frame_path), ("server.ping_path", &server.ping_path)]
        {
            if !path.starts_with('/') {
                return Err(UplinkError::config(field, format!("'{}' must start with '/'", path)));
            }
        }

        let capture = &self.capture;
        if capture.mode == TriggerMode::Interval && !is_positive(capture.send_interval_secs) {
            return Err(UplinkError::config(
                "capture.send_interval_secs",
                "must be a positive number of seconds",
            ));
        }
        if !is_non_negative(capture.trigger_cooldown_secs) {
            return Err(UplinkError::config(
                "capture.trigger_cooldown_secs",
                "must be zero or a positive number of seconds",
            ));
        }
        for (field, value) in [
            ("capture.send_interval_secs", capture.send_interval_secs),
            ("capture.trigger_cooldown_secs", capture.trigger_cooldown_secs),
        ] {
            representable(field, value)?;
        }
        if capture.jpeg_quality > 100 {
            return Err(UplinkError::config(
                "capture.jpeg_quality",
                format!("{} is outside 0-100", capture.jpeg_quality),
            ));
        }
        if !is_positive(capture.tick_hz) {
            return Err(UplinkError::config("capture.tick_hz", "must be a positive rate"));
        }
        if period(1.0 / capture.tick_hz).is_none_or(|tick| tick.is_zero()) {
            return Err(UplinkError::config(
                "capture.tick_hz",
                format!("{} Hz leaves no room for a non-zero tick period", capture.tick_hz),
            ));
        }

        if self.link.failure_threshold == 0 {
            return Err(UplinkError::config("link.failure_threshold", "must be at least 1"));
        }
        if !is_non_negative(self.link.reprobe_interval_secs) {
            return Err(UplinkError::config(
                "link.reprobe_interval_secs",
                "must be zero or a positive number of seconds",
            ));
        }
        representable("link.reprobe_interval_secs", self.link.reprobe_interval_secs)?;

        Ok(())
    }

    /// URL receiving payload POSTs
    pub fn frame_url(&self) -> String {
        format!("http://{}:{}{}", self.server.host, self.server.port, self.server.frame_path)
    }

    /// URL answering health probes
    pub fn ping_url(&self) -> String {
        format!("http://{}:{}{}", self.server.host, self.server.port, self.server.ping_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.server.timeout_ms)
    }

    pub fn send_interval(&self) -> Duration {
        secs(self.capture.send_interval_secs)
    }

    pub fn trigger_cooldown(&self) -> Duration {
        secs(self.capture.trigger_cooldown_secs)
    }

    /// Periodic reprobe period, `None` when disabled
    pub fn reprobe_interval(&self) -> Option<Duration> {
        let interval = secs(self.link.reprobe_interval_secs);
        (!interval.is_zero()).then_some(interval)
    }

    /// Resize bound, `None` when the source resolution is kept
    pub fn max_dimension(&self) -> Option<u32> {
        (self.capture.max_dimension > 0).then_some(self.capture.max_dimension)
    }

    /// Period between driver ticks
    pub fn tick_period(&self) -> Duration {
        if is_positive(self.capture.tick_hz) {
            secs(1.0 / self.capture.tick_hz)
        } else {
            Duration::from_millis(14)
        }
    }
}

/// Accessors run on validated configs, where every period converts
fn secs(value: f64) -> Duration {
    period(value).unwrap_or(Duration::ZERO)
}

fn period(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

/// Rejects second counts that do not fit in a `Duration`
fn representable(field: &str, value: f64) -> Result<()> {
    match period(value) {
        Some(_) => Ok(()),
        None => Err(UplinkError::config(field, format!("{} seconds is out of range", value))),
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = UplinkConfig::from_yaml("").unwrap();
        assert_eq!(config, UplinkConfig::default());
        assert_eq!(config.frame_url(), "http://10.0.55.172:5000/api/frame");
        assert_eq!(config.ping_url(), "http://10.0.55.172:5000/api/ping");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.send_interval(), Duration::from_millis(100));
        assert_eq!(config.max_dimension(), None);
        assert_eq!(config.link.failure_threshold, 3);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = "server:\n  host: 192.168.1.20\n  port: 3000\ncapture:\n  max_dimension: 640\n";
        let config = UplinkConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.frame_url(), "http://192.168.1.20:3000/api/frame");
        assert_eq!(config.max_dimension(), Some(640));
        assert_eq!(config.capture.jpeg_quality, 75);
        assert_eq!(config.capture.mode, TriggerMode::Interval);
    }

    #[test]
    fn discrete_mode_parses() {
        let yaml = "capture:\n  mode: discrete\n  trigger_cooldown_secs: 0.25\n";
        let config = UplinkConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.capture.mode, TriggerMode::Discrete);
        assert_eq!(config.trigger_cooldown(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = UplinkConfig::from_yaml("server:\n  hostname: x\n").unwrap_err();
        assert!(matches!(err, UplinkError::Yaml { .. }));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let cases: Vec<(&str, &str)> = vec![
            ("server:\n  port: 0\n", "server.port"),
            ("server:\n  timeout_ms: 0\n", "server.timeout_ms"),
            ("server:\n  frame_path: api/frame\n", "server.frame_path"),
            ("capture:\n  send_interval_secs: 0\n", "capture.send_interval_secs"),
            ("capture:\n  jpeg_quality: 101\n", "capture.jpeg_quality"),
            ("capture:\n  tick_hz: -1\n", "capture.tick_hz"),
            ("link:\n  failure_threshold: 0\n", "link.failure_threshold"),
            ("link:\n  reprobe_interval_secs: -2\n", "link.reprobe_interval_secs"),
            ("capture:\n  tick_hz: 1.0e10\n", "capture.tick_hz"),
            ("capture:\n  send_interval_secs: 1.0e30\n", "capture.send_interval_secs"),
            (
                "capture:\n  mode: discrete\n  send_interval_secs: 1.0e30\n",
                "capture.send_interval_secs",
            ),
            ("capture:\n  trigger_cooldown_secs: 1.0e30\n", "capture.trigger_cooldown_secs"),
            ("link:\n  reprobe_interval_secs: 1.0e30\n", "link.reprobe_interval_secs"),
        ];

        for (yaml, expected_field) in cases {
            match UplinkConfig::from_yaml(yaml) {
                Err(UplinkError::Config { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected config error for {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn fastest_accepted_tick_rate_has_a_non_zero_period() {
        let config = UplinkConfig::from_yaml("capture:\n  tick_hz: 1000000\n").unwrap();
        assert!(!config.tick_period().is_zero());

        let err = UplinkConfig::from_yaml("capture:\n  tick_hz: 1.0e10\n").unwrap_err();
        assert!(matches!(err, UplinkError::Config { field, .. } if field == "capture.tick_hz"));
    }

    #[test]
    fn huge_send_interval_is_rejected_instead_of_collapsing_to_zero() {
        let err = UplinkConfig::from_yaml("capture:\n  send_interval_secs: 1.0e30\n").unwrap_err();
        match err {
            UplinkError::Config { field, reason } => {
                assert_eq!(field, "capture.send_interval_secs");
                assert!(reason.contains("out of range"), "{reason}");
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_interval_is_fine_in_discrete_mode() {
        let yaml = "capture:\n  mode: discrete\n  send_interval_secs: 0\n";
        assert!(UplinkConfig::from_yaml(yaml).is_ok());
    }

    #[test]
    fn zero_reprobe_interval_disables_reprobe() {
        let config = UplinkConfig::from_yaml("link:\n  reprobe_interval_secs: 0\n").unwrap();
        assert_eq!(config.reprobe_interval(), None);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = UplinkConfig::load("/nonexistent/framecast.yaml").unwrap_err();
        match err {
            UplinkError::File { path, .. } => assert!(path.ends_with("framecast.yaml")),
            other => panic!("expected file error, got {other:?}"),
        }
    }
}
