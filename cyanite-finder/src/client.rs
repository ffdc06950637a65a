//! Request/response exchanges with the Cyanite backend.
//!
//! A [`BackendClient`] pairs the host rotator with a transport. Each method
//! issues exactly one request against the next host in the rotation.

use std::sync::Arc;

use crate::config::FinderConfig;
use crate::error::{BackendError, Result};
use crate::protocol::{MetricsRequest, MetricsResponse, PathEntry, PathsRequest};
use crate::rotator::HostRotator;
use crate::transport::Transport;

/// Shared connection to a set of Cyanite hosts.
///
/// Held behind an `Arc` by the finder and every reader it creates, so all of
/// them advance the same rotation.
pub struct BackendClient {
    rotator: HostRotator,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("hosts", &self.rotator.hosts())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Creates a client from a rotator and a transport.
    pub fn new(rotator: HostRotator, transport: Arc<dyn Transport>) -> Self {
        Self { rotator, transport }
    }

    /// Creates a client from configuration using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns a config error if no usable host is configured, or a backend
    /// error if the HTTP client cannot be built.
    #[cfg(feature = "http")]
    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        let transport = crate::transport::HttpTransport::new(config.timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client from configuration using a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns a config error if no usable host is configured.
    pub fn with_transport(config: &FinderConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let rotator = HostRotator::new(config.hosts())?;
        Ok(Self::new(rotator, transport))
    }

    /// The host rotation used by this client.
    pub fn rotator(&self) -> &HostRotator {
        &self.rotator
    }

    /// Resolves `pattern` against the next host's `/paths` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the body is not a
    /// JSON array of path entries.
    pub fn search_paths(&self, pattern: &str, tenant: &str) -> Result<Vec<PathEntry>> {
        let url = self.rotator.paths_endpoint();
        tracing::debug!(%url, pattern, tenant, "searching cyanite paths");

        let body = encode(&PathsRequest {
            query: pattern,
            tenant,
        })?;
        let reply = self.transport.post_json(&url, body)?;

        let entries: Vec<PathEntry> =
            serde_json::from_slice(&reply).map_err(|e| BackendError::Decode {
                url: url.clone(),
                source: e,
            })?;
        tracing::debug!(%url, count = entries.len(), "cyanite paths resolved");
        Ok(entries)
    }

    /// Fetches series from the next host's `/metrics` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the body is neither
    /// an error object nor a series response. A backend-reported `error`
    /// is returned as [`MetricsResponse::Error`], not as `Err`.
    pub fn fetch_metrics(&self, request: &MetricsRequest<'_>) -> Result<MetricsResponse> {
        let url = self.rotator.metrics_endpoint();
        tracing::debug!(
            %url,
            tenant = request.tenant,
            from = request.from,
            to = request.to,
            "fetching cyanite metrics"
        );

        let body = encode(request)?;
        let reply = self.transport.post_json(&url, body)?;

        let response = MetricsResponse::from_slice(&reply)
            .map_err(|e| BackendError::Decode { url, source: e })?;
        Ok(response)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| BackendError::Encode { source: e })
        .map_err(Into::into)
}
