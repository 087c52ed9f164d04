//! reqwest-backed transport

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::trace;

use super::Transport;
use crate::{Result, UplinkError};

/// HTTP transport over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                UplinkError::network_with_source("<client>", "failed to build HTTP client", Box::new(e))
            })?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> UplinkError {
        if err.is_timeout() {
            UplinkError::Timeout { duration: self.timeout }
        } else {
            let reason = if err.is_connect() { "connection failed" } else { "request failed" };
            UplinkError::network_with_source(url, reason, Box::new(err))
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16> {
        trace!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;
        Ok(response.status().as_u16())
    }

    async fn get(&self, url: &str) -> Result<u16> {
        trace!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| self.map_error(url, e))?;
        Ok(response.status().as_u16())
    }
}
