//! Error types for the capture-and-uplink pipeline.
//!
//! Every failure in the pipeline degrades to "skip this cycle": nothing here is
//! fatal to the host. The variants group into a few families:
//!
//! - **Encoding**: the frame buffer was malformed or the codec refused it
//! - **Send**: network failure, non-success status, or timeout on the POST
//! - **Probe**: the reachability check did not succeed
//! - **Configuration**: invalid or unreadable configuration
//! - **Serialization**: the payload could not be turned into JSON
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use framecast::UplinkError;
//!
//! let error = UplinkError::network("http://10.0.0.2:5000/api/frame", "connection refused");
//! assert!(error.is_send_failure());
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T, E = UplinkError> = std::result::Result<T, E>;

/// Main error type for the uplink pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UplinkError {
    #[error("Frame encoding failed: {reason}")]
    Encoding {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Request to {url} failed: {reason}")]
    Network {
        url: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Server at {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Health probe against {url} failed: {reason}")]
    Probe { url: String, reason: String },

    #[error("Invalid configuration for '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("Config file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config YAML error: {source}")]
    Yaml {
        #[from]
        source: serde_yaml_ng::Error,
    },

    #[error("Payload serialization failed: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl UplinkError {
    /// Returns whether a later attempt with fresh data may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            UplinkError::Network { .. } => true,
            UplinkError::Status { status, .. } => *status >= 500 || *status == 429,
            UplinkError::Timeout { .. } => true,
            UplinkError::Probe { .. } => true,
            UplinkError::Encoding { .. } => false,
            UplinkError::Config { .. } => false,
            UplinkError::File { .. } => false,
            UplinkError::Yaml { .. } => false,
            UplinkError::Serialization { .. } => false,
        }
    }

    /// Whether this error belongs to the send family that drives the failure counter.
    pub fn is_send_failure(&self) -> bool {
        matches!(
            self,
            UplinkError::Network { .. } | UplinkError::Status { .. } | UplinkError::Timeout { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            UplinkError::Encoding { .. } => vec![
                "Check the camera source reports the dimensions it delivers",
                "Verify the pixel buffer is packed RGB with 3 bytes per pixel",
            ],
            UplinkError::Network { .. } => vec![
                "Ensure the processing server is running",
                "Check the headset and server share a network",
                "Verify host and port in the configuration",
            ],
            UplinkError::Status { .. } => vec![
                "Check the server logs for the rejected request",
                "Verify the frame path matches the server route",
            ],
            UplinkError::Timeout { .. } => vec![
                "Increase server.timeout_ms",
                "Lower capture.jpeg_quality or set capture.max_dimension",
                "Check network latency to the server",
            ],
            UplinkError::Probe { .. } => vec![
                "Ensure the processing server is running",
                "Verify the ping path is served",
            ],
            UplinkError::Config { .. } => vec![
                "Check the configuration value against the documented range",
            ],
            UplinkError::File { .. } => vec![
                "Check the config file exists and is readable",
                "Check file permissions",
            ],
            UplinkError::Yaml { .. } => vec![
                "Check the config file is valid YAML",
                "Check field names and value types",
            ],
            UplinkError::Serialization { .. } => vec![
                "Check the capture sources return well-formed values",
            ],
        }
    }

    /// Helper constructor for encoding errors.
    pub fn encoding(reason: impl Into<String>) -> Self {
        UplinkError::Encoding { reason: reason.into(), source: None }
    }

    /// Helper constructor for encoding errors raised by the codec.
    pub fn encoding_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        UplinkError::Encoding { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for network errors.
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        UplinkError::Network { url: url.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for network errors with source.
    pub fn network_with_source(
        url: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        UplinkError::Network { url: url.into(), reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for non-success status codes.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        UplinkError::Status { url: url.into(), status }
    }

    /// Helper constructor for probe failures.
    pub fn probe_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        UplinkError::Probe { url: url.into(), reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        UplinkError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for config file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        UplinkError::File { path, source }
    }
}
