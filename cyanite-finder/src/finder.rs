//! Path resolution and batch fetching.
//!
//! [`CyaniteFinder`] is the entry point a query front-end registers. It
//! resolves glob patterns into [`Node`]s and fetches many leaves in one
//! round trip.
//!
//! # Example
//!
//! ```rust,no_run
//! use cyanite_finder::{CyaniteFinder, FinderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let finder = CyaniteFinder::new(&FinderConfig::from_urls(["http://cyanite-1:8080"]))?;
//!
//! let leaves: Vec<_> = finder
//!     .find_nodes("servers.*.cpu", "acme")?
//!     .filter(|node| node.is_leaf())
//!     .collect();
//!
//! let (time_range, series) = finder.fetch_multi(&leaves, "acme", 1_700_000_000, 1_700_003_600)?;
//! println!("{} series at {}s resolution", series.len(), time_range.step);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::client::BackendClient;
use crate::config::FinderConfig;
use crate::error::Result;
use crate::node::{BranchNode, FETCH_MULTI_KEY, LeafNode, Node};
use crate::protocol::{
    MetricsRequest, MetricsResponse, PathEntry, PathSelector, SeriesMap, TimeRange,
};
use crate::reader::SeriesReader;
use crate::transport::Transport;

/// A source of metric nodes that a query front-end can search and fetch.
pub trait Finder {
    /// Iterator returned by [`find_nodes`](Self::find_nodes).
    type Nodes: Iterator<Item = Node>;

    /// Resolves `pattern` for `tenant` into nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers with an
    /// unusable body.
    fn find_nodes(&self, pattern: &str, tenant: &str) -> Result<Self::Nodes>;

    /// Fetches every node in `nodes` with a single request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers with an
    /// unusable body.
    fn fetch_multi(
        &self,
        nodes: &[Node],
        tenant: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<(TimeRange, SeriesMap)>;
}

/// Finder backed by one or more Cyanite hosts.
#[derive(Debug, Clone)]
pub struct CyaniteFinder {
    client: Arc<BackendClient>,
}

impl CyaniteFinder {
    /// Batch-fetch group served by this finder.
    pub const FETCH_MULTI_KEY: &'static str = FETCH_MULTI_KEY;

    /// Creates a finder that talks to the configured hosts over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a config error if no usable host is configured, or a backend
    /// error if the HTTP client cannot be built.
    #[cfg(feature = "http")]
    pub fn new(config: &FinderConfig) -> Result<Self> {
        Ok(Self::from_client(BackendClient::from_config(config)?))
    }

    /// Creates a finder that sends requests through `transport`.
    ///
    /// # Errors
    ///
    /// Returns a config error if no usable host is configured.
    pub fn with_transport(config: &FinderConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::from_client(BackendClient::with_transport(config, transport)?))
    }

    /// Wraps an existing client.
    pub fn from_client(client: BackendClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The shared backend client.
    pub fn client(&self) -> &Arc<BackendClient> {
        &self.client
    }

    /// Resolves `pattern` for `tenant`.
    ///
    /// One request is made up front and the whole response decoded before
    /// anything is returned; nodes are then built as the iterator advances.
    /// Leaves get a [`SeriesReader`] scoped to `tenant`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the request fails or the body is not a
    /// JSON array of path entries. Nothing is yielded in that case.
    pub fn find_nodes(&self, pattern: &str, tenant: &str) -> Result<FindNodes> {
        let entries = self.client.search_paths(pattern, tenant)?;
        Ok(FindNodes {
            entries: entries.into_iter(),
            tenant: tenant.to_string(),
            client: Arc::clone(&self.client),
        })
    }

    /// Fetches the given nodes' series with one request.
    ///
    /// # Errors
    ///
    /// See [`fetch_paths`](Self::fetch_paths).
    pub fn fetch_multi(
        &self,
        nodes: &[Node],
        tenant: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<(TimeRange, SeriesMap)> {
        self.fetch_paths(nodes.iter().map(Node::path), tenant, start_time, end_time)
    }

    /// Fetches the series at `paths` with one request.
    ///
    /// The series map is returned exactly as the backend sent it: requested
    /// paths without data are absent, not filled in. A backend `error`
    /// yields the requested span as one step and an empty map. An empty
    /// `paths` yields the same without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the request fails or the response body is
    /// not a valid `/metrics` reply.
    pub fn fetch_paths<I, S>(
        &self,
        paths: I,
        tenant: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<(TimeRange, SeriesMap)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Vec<S> = paths.into_iter().collect();
        if paths.is_empty() {
            return Ok((TimeRange::degraded(start_time, end_time), SeriesMap::new()));
        }

        let request = MetricsRequest {
            path: PathSelector::Many(paths.iter().map(AsRef::as_ref).collect()),
            from: start_time,
            to: end_time,
            tenant,
        };

        match self.client.fetch_metrics(&request)? {
            MetricsResponse::Error(message) => {
                tracing::warn!(
                    paths = paths.len(),
                    tenant,
                    error = %message,
                    "cyanite reported an error, returning empty series"
                );
                Ok((TimeRange::degraded(start_time, end_time), SeriesMap::new()))
            }
            MetricsResponse::Series(data) => {
                tracing::debug!(
                    requested = paths.len(),
                    returned = data.series.len(),
                    "cyanite batch fetch complete"
                );
                Ok((data.time_range(), data.series))
            }
        }
    }
}

impl Finder for CyaniteFinder {
    type Nodes = FindNodes;

    fn find_nodes(&self, pattern: &str, tenant: &str) -> Result<FindNodes> {
        CyaniteFinder::find_nodes(self, pattern, tenant)
    }

    fn fetch_multi(
        &self,
        nodes: &[Node],
        tenant: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<(TimeRange, SeriesMap)> {
        CyaniteFinder::fetch_multi(self, nodes, tenant, start_time, end_time)
    }
}

/// Nodes resolved by one path search, in backend order.
///
/// Finite and single-use: iterate again by calling
/// [`CyaniteFinder::find_nodes`] again, which re-issues the request.
#[derive(Debug)]
pub struct FindNodes {
    entries: std::vec::IntoIter<PathEntry>,
    tenant: String,
    client: Arc<BackendClient>,
}

impl FindNodes {
    fn to_node(&self, entry: PathEntry) -> Node {
        if entry.leaf {
            let reader = SeriesReader::new(
                entry.path.clone(),
                self.tenant.clone(),
                Arc::clone(&self.client),
            );
            Node::Leaf(LeafNode::new(entry.path, reader))
        } else {
            Node::Branch(BranchNode::new(entry.path))
        }
    }
}

impl Iterator for FindNodes {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(self.to_node(entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for FindNodes {}
