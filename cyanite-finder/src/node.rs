//! Node and interval types handed to the query front-end.
//!
//! A path search yields [`Node`]s: leaves are fetchable series carrying
//! their own [`SeriesReader`], branches are namespace levels with nothing
//! to fetch. [`IntervalSet`] describes when a leaf has data.

use crate::error::Result;
use crate::protocol::{SeriesPayload, TimeRange};
use crate::reader::SeriesReader;

/// Batch-fetch group shared by every node this crate produces.
///
/// Leaves with the same key can be fetched together through
/// [`Finder::fetch_multi`](crate::finder::Finder::fetch_multi).
pub const FETCH_MULTI_KEY: &str = "cyanite";

/// A closed time interval in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Start of the interval.
    pub start: f64,
    /// End of the interval, never before `start`.
    pub end: f64,
}

impl Interval {
    /// Creates an interval, clamping `end` so it is never before `start`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length of the interval in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The time ranges for which a series is considered available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Creates a set from the given intervals.
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    /// The intervals in this set.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the set has no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sum of all interval durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(Interval::duration).sum()
    }
}

/// A fetchable metric series.
#[derive(Debug, Clone)]
pub struct LeafNode {
    path: String,
    reader: SeriesReader,
}

impl LeafNode {
    /// Creates a leaf backed by `reader`.
    pub fn new(path: impl Into<String>, reader: SeriesReader) -> Self {
        Self {
            path: path.into(),
            reader,
        }
    }

    /// Full metric path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        last_segment(&self.path)
    }

    /// The reader fetching this leaf's data.
    pub fn reader(&self) -> &SeriesReader {
        &self.reader
    }

    /// Batch-fetch group of this leaf.
    pub fn fetch_multi_key(&self) -> &'static str {
        FETCH_MULTI_KEY
    }

    /// Fetches this leaf's samples for `[start_time, end_time]`.
    ///
    /// # Errors
    ///
    /// See [`SeriesReader::fetch`].
    pub fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeRange, SeriesPayload)> {
        self.reader.fetch(start_time, end_time)
    }

    /// When this leaf has data.
    pub fn intervals(&self) -> IntervalSet {
        self.reader.get_intervals()
    }
}

/// An intermediate namespace level with no data of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    path: String,
}

impl BranchNode {
    /// Creates a branch.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Full metric path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        last_segment(&self.path)
    }
}

/// A node produced by a path search.
#[derive(Debug, Clone)]
pub enum Node {
    /// A fetchable series.
    Leaf(LeafNode),
    /// A namespace level.
    Branch(BranchNode),
}

impl Node {
    /// Full metric path.
    pub fn path(&self) -> &str {
        match self {
            Self::Leaf(leaf) => leaf.path(),
            Self::Branch(branch) => branch.path(),
        }
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        last_segment(self.path())
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// The leaf's reader, or `None` for a branch.
    pub fn reader(&self) -> Option<&SeriesReader> {
        match self {
            Self::Leaf(leaf) => Some(leaf.reader()),
            Self::Branch(_) => None,
        }
    }

    /// Returns the leaf, or `None` for a branch.
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Branch(_) => None,
        }
    }
}

impl From<LeafNode> for Node {
    fn from(leaf: LeafNode) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<BranchNode> for Node {
    fn from(branch: BranchNode) -> Self {
        Self::Branch(branch)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
