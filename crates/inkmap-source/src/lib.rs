//! Feature sources with sort pushdown for the inkmap renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Source traits** - the capability interface between the compositor
//!   and feature storage: a source either delivers features already
//!   ordered by a requested sort key, or declines explicitly
//! - **Memory source** - features held in memory, sorted at open time;
//!   the workhorse of the compositor test suite
//! - **Property source** - a tiny line-oriented feature file format for
//!   fixtures and demos, one typed header plus one feature per line
//!
//! # Design
//!
//! Ordering is *pushed down*: the compositor never sorts features itself,
//! it only asks a source for an ordered stream. How the source sorts (an
//! index, an external sort, an in-memory sort over data it already holds)
//! is the source's own business. A source that cannot honor the request
//! must fail at `open` rather than silently stream unordered features,
//! because an unordered stream would paint a visually wrong map with no
//! warning.

/// In-memory feature source.
pub mod memory;
/// Line-oriented property file feature source.
pub mod property;

use inkmap_feature::Feature;
use inkmap_style::SortKey;
use thiserror::Error;

pub use memory::MemorySource;
pub use property::{Column, PropertySource, PropertyType, Schema};

/// Errors raised by feature sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source cannot deliver features in the requested order.
    #[error("source cannot deliver features ordered by '{key}'")]
    UnsupportedOrdering {
        /// Display form of the requested sort key.
        key: String,
    },
    /// The backing file could not be read.
    #[error("failed to read '{path}': {message}")]
    Io {
        /// Path of the backing file.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// The backing file is malformed.
    #[error("parse error at {path}:{line}: {message}")]
    Parse {
        /// Path of the backing file.
        path: String,
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

/// A forward-only stream of features.
///
/// `next_feature` returns `Ok(None)` exactly once, at the end of the
/// stream; the caller must not pull past that point. Streams may block on
/// I/O inside `next_feature`.
pub trait FeatureStream {
    /// Pull the next feature, or `None` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the underlying source fails mid-read.
    fn next_feature(&mut self) -> Result<Option<Feature>, SourceError>;
}

impl std::fmt::Debug for dyn FeatureStream + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn FeatureStream")
    }
}

/// A queryable collection of features.
///
/// The single capability that matters to the compositor is ordered
/// delivery: `open(Some(key))` must either produce a stream whose features
/// arrive sorted by `key`, or fail with
/// [`SourceError::UnsupportedOrdering`]. There is no "best effort" mode.
pub trait FeatureSource {
    /// Human-readable source name for error reports.
    fn name(&self) -> &str;

    /// Open a stream over all features, optionally ordered by `sort`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnsupportedOrdering`] if `sort` is requested
    /// but cannot be honored, or another [`SourceError`] if the source
    /// fails to open.
    fn open(&self, sort: Option<&SortKey>) -> Result<Box<dyn FeatureStream>, SourceError>;
}
