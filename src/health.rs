//! Reachability probing

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::transport::{Transport, is_success};
use crate::types::ConnectionState;
use crate::{Result, UplinkError};

/// GETs the ping route and reports whether the server answered 2xx in time
pub struct HealthProbe {
    transport: Arc<dyn Transport>,
    url: String,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, timeout: Duration) -> Self {
        Self { transport, url: url.into(), timeout }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one probe; every failure mode surfaces as [`UplinkError::Probe`]
    pub fn probe(&self) -> BoxFuture<'static, Result<()>> {
        let transport = Arc::clone(&self.transport);
        let url = self.url.clone();
        let timeout = self.timeout;

        async move {
            match tokio::time::timeout(timeout, transport.get(&url)).await {
                Ok(Ok(status)) if is_success(status) => Ok(()),
                Ok(Ok(status)) => {
                    Err(UplinkError::probe_failed(url, format!("status {}", status)))
                }
                Ok(Err(err)) => Err(UplinkError::probe_failed(url, err.to_string())),
                Err(_) => {
                    Err(UplinkError::probe_failed(url, format!("no answer within {:?}", timeout)))
                }
            }
        }
        .boxed()
    }

    /// Apply a probe result to the connection state; returns reachability
    pub fn apply(&self, result: &Result<()>, state: &mut ConnectionState) -> bool {
        match result {
            Ok(()) => {
                if !state.is_connected() {
                    info!("Server reachable at {}", self.url);
                }
                state.record_probe(true);
                true
            }
            Err(err) => {
                warn!("{}", err);
                state.record_probe(false);
                false
            }
        }
    }
}
