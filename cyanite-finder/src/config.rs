//! Finder configuration.
//!
//! A finder is built from a single [`FinderConfig`]. The configuration names
//! one or more Cyanite base URLs, either as a list (`urls`) or as a single
//! string (`url`). Nothing is read from the environment; callers that keep
//! settings elsewhere build the config themselves.
//!
//! # Example
//!
//! ```rust
//! use cyanite_finder::config::FinderConfig;
//! use cyanite_finder::rotator::HostRotator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = serde_json::json!({
//!     "cyanite": { "urls": ["http://cyanite-1:8080", "http://cyanite-2:8080/"] }
//! });
//! let config = FinderConfig::from_section(&doc)?;
//! let rotator = HostRotator::new(config.hosts())?;
//! assert_eq!(rotator.hosts(), ["http://cyanite-1:8080", "http://cyanite-2:8080"]);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the section holding finder settings in a host configuration document.
pub const SECTION: &str = "cyanite";

/// Configuration for a [`CyaniteFinder`](crate::finder::CyaniteFinder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Base URLs of the backend hosts, used in rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    /// A single base URL. Ignored when `urls` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Optional per-request timeout in seconds. Requests never time out
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl FinderConfig {
    /// Creates a config that rotates over the given hosts.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: Some(urls.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Creates a config with a single host.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Reads the `cyanite` section of a larger configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSection`] if the document has no such
    /// section, or [`ConfigError::Parse`] if the section is malformed.
    pub fn from_section(document: &serde_json::Value) -> Result<Self, ConfigError> {
        let section = document
            .get(SECTION)
            .ok_or_else(|| ConfigError::MissingSection {
                section: SECTION.to_string(),
            })?;
        serde_json::from_value(section.clone()).map_err(|e| ConfigError::Parse { source: e })
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Returns the request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the configured host entries as written.
    ///
    /// `urls` takes precedence over `url`. Entries are not validated here;
    /// [`HostRotator::new`](crate::rotator::HostRotator::new) normalizes
    /// them and rejects an empty or blank list.
    pub fn hosts(&self) -> Vec<&str> {
        match (&self.urls, &self.url) {
            (Some(urls), _) => urls.iter().map(String::as_str).collect(),
            (None, Some(url)) => vec![url.as_str()],
            (None, None) => Vec::new(),
        }
    }
}
