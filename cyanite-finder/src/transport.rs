//! HTTP transport used to reach the Cyanite backend.
//!
//! The [`Transport`] trait is the seam between request building and the
//! network. [`HttpTransport`] implements it with a blocking reqwest client
//! (behind the default `http` feature); hosts with their own HTTP stack can
//! plug in a different implementation.

use crate::error::BackendError;

/// MIME type of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Delivers a JSON body to an endpoint and returns the raw response body.
///
/// Implementations return the body regardless of HTTP status; deciding
/// whether a body is usable is left to the caller.
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` with `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the request cannot be delivered or the
    /// response body cannot be read.
    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, BackendError>;
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use reqwest::header::CONTENT_TYPE;

    use super::{JSON_CONTENT_TYPE, Transport};
    use crate::error::BackendError;

    /// Blocking reqwest transport.
    ///
    /// One client is built per finder and shared by its readers, so
    /// connections are pooled the way reqwest pools them by default.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::blocking::Client,
    }

    impl HttpTransport {
        /// Builds a transport. `None` disables the request timeout.
        ///
        /// # Errors
        ///
        /// Returns [`BackendError::ClientCreate`] if the TLS backend or
        /// client cannot be initialised.
        pub fn new(timeout: Option<Duration>) -> Result<Self, BackendError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| BackendError::ClientCreate { source: e })?;
            Ok(Self { client })
        }
    }

    impl Transport for HttpTransport {
        fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, BackendError> {
            let resp = self
                .client
                .post(url)
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(body)
                .send()
                .map_err(|e| BackendError::Request {
                    url: url.to_string(),
                    source: e,
                })?;

            let status = resp.status();
            if !status.is_success() {
                tracing::warn!(
                    url,
                    status = status.as_u16(),
                    "cyanite returned non-success status"
                );
            }

            let bytes = resp.bytes().map_err(|e| BackendError::Body {
                url: url.to_string(),
                source: e,
            })?;
            Ok(bytes.to_vec())
        }
    }
}
