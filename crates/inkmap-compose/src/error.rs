//! Error taxonomy for a render request.
//!
//! Two severities exist and they never mix:
//!
//! - [`ComposeError`] is fatal: the ordering contract itself is broken
//!   (a sort attribute cannot be resolved, a source cannot honor the
//!   requested order, grouped layers disagree on their key). Further
//!   output would be untrustworthy, so the render aborts.
//! - [`SinkError`] is recoverable: one feature failed to paint. A single
//!   bad geometry must not blank the whole map, so the failure is recorded
//!   in the render report and the merge continues.

use thiserror::Error;

use inkmap_source::SourceError;
use inkmap_style::StyleError;

/// Fatal render errors. Any of these aborts the whole render request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// A sort attribute could not be resolved on a feature of the stream.
    ///
    /// Raised both when the attribute is missing and when two features
    /// carry values of incomparable types for it. Never downgraded to
    /// "skip the feature": a silently dropped feature corrupts the map.
    #[error(
        "layer '{layer}': cannot resolve sort attribute '{attribute}' on feature '{feature}': {reason}"
    )]
    AttributeResolution {
        /// Layer whose stream produced the feature.
        layer: String,
        /// The sort attribute that failed to resolve.
        attribute: String,
        /// Identifier of the offending feature.
        feature: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The layer's source cannot deliver features in the requested order.
    ///
    /// There is no fallback to unordered rendering; that would paint a
    /// visually wrong map without warning.
    #[error("layer '{layer}': source cannot deliver features ordered by '{key}'")]
    UnsupportedOrdering {
        /// Layer whose source declined.
        layer: String,
        /// Display form of the requested sort key.
        key: String,
    },

    /// Grouped layers disagree on their sort key.
    ///
    /// Detected at assembly time, before any stream is opened or any
    /// feature painted.
    #[error("group '{group}': layer '{layer}' {detail}")]
    IncompatibleGroupSort {
        /// The shared group token.
        group: String,
        /// The offending member layer.
        layer: String,
        /// How the member disagrees with the group's key.
        detail: String,
    },

    /// A stream was pulled past its end. This is a programming error in
    /// the driver, not a data problem.
    #[error("layer '{layer}': stream pulled after end")]
    StreamExhausted {
        /// Layer whose stream was over-pulled.
        layer: String,
    },

    /// A layer's rule options failed to parse.
    #[error("layer '{layer}': {source}")]
    Style {
        /// The offending layer.
        layer: String,
        /// The underlying option parse error.
        #[source]
        source: StyleError,
    },

    /// A layer's source failed to open or read.
    #[error("layer '{layer}': {source}")]
    Source {
        /// The offending layer.
        layer: String,
        /// The underlying source error.
        #[source]
        source: SourceError,
    },
}

/// A recoverable per-feature paint failure reported by a render sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SinkError {
    /// What went wrong while painting the feature.
    pub message: String,
}

impl SinkError {
    /// Build a sink error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
