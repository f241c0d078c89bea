//! Style model and z-order option parsing for the inkmap renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Color values** - hex and named color parsing for symbolizer fills
//!   and strokes
//! - **Symbolizers** - how a layer's geometry is painted (fill, stroke,
//!   marker)
//! - **Z-order options** - the `sortBy` / `sortByGroup` rule options that
//!   control cross-layer painting order, per
//!   [GeoServer z-ordering](https://docs.geoserver.org/latest/en/user/styling/sld/extensions/z-order/)
//! - **Map documents** - the serde-backed JSON map description consumed by
//!   the CLI
//!
//! # Not Yet Implemented
//!
//! - Scale-dependent rules
//! - Expression-valued symbolizer parameters (colors and widths are
//!   literals)
//! - Label/text symbolizers

/// Color values for symbolizer fills and strokes.
pub mod color;
/// The serde map document consumed by the CLI.
pub mod map_spec;
/// `sortBy` / `sortByGroup` parsing into typed z-order options.
pub mod sort;
/// Symbolizers: how a layer's geometry is painted.
pub mod symbolizer;

pub use color::ColorValue;
pub use map_spec::{LayerSpec, MapSpec};
pub use sort::{
    GroupToken, RuleOptions, SortDirection, SortKey, SortSpecEntry, StyleError, ZOrderOptions,
};
pub use symbolizer::{FillSymbolizer, LayerStyle, MarkerSymbolizer, StrokeSymbolizer, Symbolizer};
