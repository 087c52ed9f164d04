//! Transport trait for the two HTTP exchanges the pipeline makes

mod http;

pub use http::HttpTransport;

use crate::Result;

/// Carrier for payload POSTs and health pings
///
/// Implementations report the HTTP status of the response and leave its
/// interpretation to the caller. Transport-level failures (refused
/// connection, reset, DNS) come back as errors. Timeouts are enforced by the
/// caller, so an implementation may also apply its own.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// POST a JSON body, returning the response status code
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16>;

    /// GET a URL, returning the response status code
    async fn get(&self, url: &str) -> Result<u16>;
}

/// Whether a status code counts as success
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
