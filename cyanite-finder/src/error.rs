//! Error types for the Cyanite finder.

use thiserror::Error;

/// The main error type for all finder and reader operations.
///
/// Backend-reported logical errors (an `error` field in a `/metrics`
/// response) are not represented here: readers turn those into an empty
/// result with a zero-data envelope instead.
#[derive(Error, Debug)]
pub enum CyaniteError {
    /// The finder could not be configured.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A request to the backend failed or returned an unusable body.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised while building a finder from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No backend hosts were configured.
    #[error("no cyanite hosts configured: set `urls` or `url`")]
    NoHosts,

    /// A configured host is blank once trailing slashes are removed.
    #[error("cyanite host at index {index} is empty")]
    EmptyHost {
        /// Position of the offending entry in the host list.
        index: usize,
    },

    /// The host configuration document has no finder section.
    #[error("configuration has no '{section}' section")]
    MissingSection {
        /// The section name that was looked up.
        section: String,
    },

    /// The finder section could not be parsed.
    #[error("failed to parse finder configuration: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while talking to the Cyanite backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to create the HTTP client.
    #[cfg(feature = "http")]
    #[error("failed to create HTTP client: {source}")]
    ClientCreate {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP request could not be sent or no response arrived.
    #[cfg(feature = "http")]
    #[error("request to '{url}' failed: {source}")]
    Request {
        /// The endpoint that was called.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be read.
    #[cfg(feature = "http")]
    #[error("failed to read response body from '{url}': {source}")]
    Body {
        /// The endpoint that was called.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// A custom transport failed to deliver the request.
    #[error("transport to '{url}' failed: {reason}")]
    Transport {
        /// The endpoint that was called.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// Failed to serialize a request body.
    #[error("failed to encode request: {source}")]
    Encode {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The response body was not the JSON shape the endpoint returns.
    #[error("malformed response from '{url}': {source}")]
    Decode {
        /// The endpoint that was called.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for `Result<T, CyaniteError>`.
pub type Result<T> = std::result::Result<T, CyaniteError>;
