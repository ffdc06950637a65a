//! # cyanite-finder
//!
//! Graphite-style finder and reader for the Cyanite metrics store.
//!
//! A query front-end uses this crate to turn metric-name patterns into
//! nodes and to fetch series data over Cyanite's JSON HTTP API. Requests
//! are spread over several Cyanite hosts in round-robin order.
//!
//! ## Key Properties
//!
//! - One synchronous HTTP request per operation; no caching, no retries
//! - Every request carries the caller's tenant
//! - A backend-reported `error` on a series fetch becomes an empty result,
//!   so charts render empty rather than fail
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cyanite_finder::{CyaniteFinder, FinderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FinderConfig::from_urls(["http://cyanite-1:8080", "http://cyanite-2:8080"]);
//! let finder = CyaniteFinder::new(&config)?;
//!
//! for node in finder.find_nodes("servers.web1.*", "acme")? {
//!     if let Some(reader) = node.reader() {
//!         let (time_range, values) = reader.fetch(1_700_000_000, 1_700_003_600)?;
//!         println!("{}: {} samples every {}s", node.path(), values.len(), time_range.step);
//!     } else {
//!         println!("{}/", node.path());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`finder`] - Path search and batch fetch
//! - [`reader`] - Single-series fetch and availability
//! - [`node`] - Node and interval types handed to the front-end
//! - [`client`] - One request/response exchange per call
//! - [`rotator`] - Round-robin host selection
//! - [`transport`] - HTTP seam and the reqwest implementation
//! - [`protocol`] - JSON wire types
//! - [`config`] - Finder configuration
//! - [`error`] - Error types

pub mod client;
pub mod config;
pub mod error;
pub mod finder;
pub mod node;
pub mod protocol;
pub mod reader;
pub mod rotator;
pub mod transport;

// Re-export primary API types at crate root for convenience.
pub use config::FinderConfig;
pub use error::{BackendError, ConfigError, CyaniteError, Result};
pub use finder::{CyaniteFinder, FindNodes, Finder};
pub use node::{BranchNode, FETCH_MULTI_KEY, Interval, IntervalSet, LeafNode, Node};
pub use protocol::{SeriesMap, SeriesPayload, TimeRange};
pub use reader::{Reader, SeriesReader};
pub use rotator::HostRotator;
