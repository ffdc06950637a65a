//! Reading series data for a single leaf.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::client::BackendClient;
use crate::error::Result;
use crate::node::{Interval, IntervalSet};
use crate::protocol::{MetricsRequest, MetricsResponse, PathSelector, SeriesPayload, TimeRange};

/// How far back a series is assumed to have data.
pub const ASSUMED_AVAILABILITY_SECS: f64 = 2.0 * 3600.0;

/// Fetches data for one resolved series.
pub trait Reader {
    /// Fetches samples for `[start_time, end_time]`, in epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers with
    /// an unusable body.
    fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeRange, SeriesPayload)>;

    /// Returns the time ranges for which the series has data.
    fn get_intervals(&self) -> IntervalSet;
}

/// Reader for a single Cyanite series.
///
/// The `(path, tenant)` pair is fixed at construction. Readers are cheap to
/// clone and share their finder's backend client.
#[derive(Debug, Clone)]
pub struct SeriesReader {
    path: String,
    tenant: String,
    client: Arc<BackendClient>,
}

impl SeriesReader {
    /// Creates a reader for `path` within `tenant`.
    pub fn new(
        path: impl Into<String>,
        tenant: impl Into<String>,
        client: Arc<BackendClient>,
    ) -> Self {
        Self {
            path: path.into(),
            tenant: tenant.into(),
            client,
        }
    }

    /// The series path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The tenant sent with every request.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Fetches samples for `[start_time, end_time]`, in epoch seconds.
    ///
    /// If the backend answers with an `error` object the result is the
    /// requested span as one step with no samples. If the response has no
    /// entry for this path the samples are empty.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the request fails or the response body is
    /// not a valid `/metrics` reply.
    pub fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeRange, SeriesPayload)> {
        let request = MetricsRequest {
            path: PathSelector::Single(&self.path),
            from: start_time,
            to: end_time,
            tenant: &self.tenant,
        };

        match self.client.fetch_metrics(&request)? {
            MetricsResponse::Error(message) => {
                tracing::warn!(
                    path = %self.path,
                    tenant = %self.tenant,
                    error = %message,
                    "cyanite reported an error, returning empty series"
                );
                Ok((TimeRange::degraded(start_time, end_time), Vec::new()))
            }
            MetricsResponse::Series(mut data) => {
                let time_range = data.time_range();
                let values = data.series.remove(&self.path).unwrap_or_default();
                Ok((time_range, values))
            }
        }
    }

    /// Returns the window this series is assumed to have data for.
    ///
    /// Cyanite does not report availability yet, so this is the last two
    /// hours up to now.
    pub fn get_intervals(&self) -> IntervalSet {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64());
        self.get_intervals_at(now)
    }

    /// Like [`get_intervals`](Self::get_intervals) with an explicit clock,
    /// in epoch seconds.
    pub fn get_intervals_at(&self, now: f64) -> IntervalSet {
        // TODO: use per-series availability once cyanite exposes it
        let start = now - ASSUMED_AVAILABILITY_SECS;
        IntervalSet::new(vec![Interval::new(start, start.max(now))])
    }
}

impl Reader for SeriesReader {
    fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeRange, SeriesPayload)> {
        SeriesReader::fetch(self, start_time, end_time)
    }

    fn get_intervals(&self) -> IntervalSet {
        SeriesReader::get_intervals(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FinderConfig;
    use crate::error::{BackendError, CyaniteError};
    use crate::transport::Transport;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn reader(mock: &Arc<MockTransport>, path: &str) -> SeriesReader {
        let config = FinderConfig::from_urls(["http://h1", "http://h2"]);
        let client =
            BackendClient::with_transport(&config, Arc::clone(mock) as Arc<dyn Transport>).unwrap();
        SeriesReader::new(path, "acme", Arc::new(client))
    }

    #[test]
    fn test_fetch_returns_series() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(r#"{"from":0,"to":100,"step":10,"series":{"a":[1,2,3]}}"#);

        let (time_range, values) = reader(&mock, "a").fetch(0, 100).unwrap();
        assert_eq!(time_range.as_tuple(), (0, 100, 10));
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);

        let requests = mock.requests();
        assert_eq!(requests[0].url, "http://h1/metrics");
        assert_eq!(
            requests[0].body,
            json!({"path": "a", "from": 0, "to": 100, "tenant": "acme"})
        );
    }

    #[test]
    fn test_fetch_error_degrades() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(r#"{"error":"no data"}"#);

        let (time_range, values) = reader(&mock, "a").fetch(5, 15).unwrap();
        assert_eq!(time_range.as_tuple(), (5, 15, 10));
        assert!(values.is_empty());
    }

    #[test]
    fn test_fetch_missing_path_is_empty() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(r#"{"from":0,"to":60,"step":60,"series":{"other":[1]}}"#);

        let (time_range, values) = reader(&mock, "a").fetch(0, 60).unwrap();
        assert_eq!(time_range.as_tuple(), (0, 60, 60));
        assert!(values.is_empty());
    }

    #[test]
    fn test_fetch_malformed_body_is_error() {
        let mock = Arc::new(MockTransport::new());
        mock.reply("not json");

        let err = reader(&mock, "a").fetch(0, 60).unwrap_err();
        assert!(matches!(err, CyaniteError::Backend(BackendError::Decode { .. })));
    }

    #[test]
    fn test_repeated_fetches_rotate_hosts() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(r#"{"error":"x"}"#).reply(r#"{"error":"x"}"#);

        let reader = reader(&mock, "a");
        reader.fetch(0, 1).unwrap();
        reader.fetch(0, 1).unwrap();

        let urls: Vec<String> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://h1/metrics", "http://h2/metrics"]);
    }

    #[test]
    fn test_intervals_cover_last_two_hours() {
        let mock = Arc::new(MockTransport::new());
        let intervals = reader(&mock, "a").get_intervals_at(10_000.0);

        assert_eq!(intervals.intervals(), &[Interval::new(2_800.0, 10_000.0)]);
        assert_eq!(intervals.total_duration(), 7_200.0);
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_intervals_from_wall_clock() {
        let mock = Arc::new(MockTransport::new());
        let intervals = reader(&mock, "a").get_intervals();

        assert_eq!(intervals.len(), 1);
        let interval = intervals.intervals()[0];
        assert!(interval.end >= interval.start);
        assert!((interval.duration() - ASSUMED_AVAILABILITY_SECS).abs() < 1.0);
    }

    #[test]
    fn test_accessors() {
        let mock = Arc::new(MockTransport::new());
        let reader = reader(&mock, "servers.web1.cpu");
        assert_eq!(reader.path(), "servers.web1.cpu");
        assert_eq!(reader.tenant(), "acme");
    }
}
