//! Ordered multi-layer compositor for the inkmap renderer.
//!
//! # Scope
//!
//! This crate implements the machinery that paints features from multiple
//! map layers in one globally consistent stacking order, per
//! [GeoServer z-ordering](https://docs.geoserver.org/latest/en/user/styling/sld/extensions/z-order/):
//!
//! - **Layer assembly** - partitioning the layer list into standalone
//!   layers and merge groups, with eager validation of group sort keys
//! - **Ordered streams** - per-layer feature streams with the sort pushed
//!   down to the source and sort-key values extracted per feature
//! - **The compositor** - a k-way merge over the ordered streams of a
//!   group, dispatching one feature at a time to a paint sink while
//!   buffering at most one feature per stream
//! - **Render reporting** - recoverable paint failures are collected and
//!   rendering continues; ordering-contract failures abort the render
//!
//! # Memory model
//!
//! The compositor never materializes a layer. For a merge group of N
//! layers its working set is N buffered features, independent of how many
//! features each layer holds. "Sort everything into one array and walk
//! it" is exactly the design this crate exists to avoid.

/// Layer assembly: partitioning layers into render units.
pub mod assembly;
/// The k-way merge compositor and its sink/listener traits.
pub mod compositor;
/// Error taxonomy for a render request.
pub mod error;
/// Layer descriptors and identities.
pub mod layer;
/// Ordered per-layer feature streams.
pub mod stream;

pub use assembly::{MergeGroup, RenderUnit, assemble};
pub use compositor::{
    CancelFlag, PaintFailure, RenderListener, RenderReport, RenderSink, ZOrderCompositor,
};
pub use error::{ComposeError, SinkError};
pub use layer::{LayerDescriptor, LayerId};
pub use stream::OrderedFeatureStream;
