//! Wire types for the Cyanite HTTP API.
//!
//! Two endpoints are used, both taking a JSON body via `POST`:
//!
//! - `{host}/paths` with `{"query", "tenant"}`, answering with an array of
//!   `{"path", "leaf"}` objects.
//! - `{host}/metrics` with `{"path", "from", "to", "tenant"}`, where `path`
//!   is a string or an array of strings, answering with
//!   `{"from", "to", "step", "series"}` or `{"error"}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Samples of one series. `None` marks a slot with no value.
pub type SeriesPayload = Vec<Option<f64>>;

/// Series keyed by metric path, as returned by a batch fetch.
pub type SeriesMap = BTreeMap<String, SeriesPayload>;

/// Body of a `/paths` request.
#[derive(Debug, Clone, Serialize)]
pub struct PathsRequest<'a> {
    /// Glob-style pattern to resolve.
    pub query: &'a str,
    /// Tenant the lookup is scoped to.
    pub tenant: &'a str,
}

/// One entry of a `/paths` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Full dotted metric path.
    pub path: String,
    /// Whether the path names a fetchable series.
    pub leaf: bool,
}

/// The `path` field of a `/metrics` request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PathSelector<'a> {
    /// A single series.
    Single(&'a str),
    /// Several series fetched in one round trip.
    Many(Vec<&'a str>),
}

/// Body of a `/metrics` request.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsRequest<'a> {
    /// Series to fetch.
    pub path: PathSelector<'a>,
    /// Range start, epoch seconds.
    pub from: i64,
    /// Range end, epoch seconds.
    pub to: i64,
    /// Tenant the series belong to.
    pub tenant: &'a str,
}

/// Time span and resolution of a series result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// First timestamp, epoch seconds.
    pub start: i64,
    /// Last timestamp, epoch seconds.
    pub end: i64,
    /// Seconds between samples.
    pub step: i64,
}

impl TimeRange {
    /// Creates a time range.
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step }
    }

    /// The envelope reported when the backend has nothing to return:
    /// the requested span as a single step, saturating at the `i64` bounds.
    pub fn degraded(start: i64, end: i64) -> Self {
        Self::new(start, end, end.saturating_sub(start))
    }

    /// Returns `(start, end, step)`.
    pub fn as_tuple(&self) -> (i64, i64, i64) {
        (self.start, self.end, self.step)
    }
}

/// A successful `/metrics` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesData {
    /// Start of the returned range.
    pub from: i64,
    /// End of the returned range.
    pub to: i64,
    /// Resolution of the returned samples.
    pub step: i64,
    /// Samples keyed by path.
    #[serde(default)]
    pub series: SeriesMap,
}

impl SeriesData {
    /// The time range described by this response.
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.from, self.to, self.step)
    }
}

/// A decoded `/metrics` response.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsResponse {
    /// The backend reported an error instead of data.
    Error(String),
    /// The backend returned series data.
    Series(SeriesData),
}

impl MetricsResponse {
    /// Decodes a `/metrics` response body.
    ///
    /// Any object carrying an `error` key is an error response, whatever
    /// else it contains.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the body is not an object or a data
    /// response is missing `from`, `to` or `step`.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)?;

        if let Some(error) = object.remove("error") {
            let message = match error {
                serde_json::Value::String(message) => message,
                other => other.to_string(),
            };
            return Ok(Self::Error(message));
        }

        serde_json::from_value(serde_json::Value::Object(object)).map(Self::Series)
    }
}
