//! Symbolizers: how a layer's geometry is painted.
//!
//! Modeled after the polygon/line/point symbolizers of
//! [OGC Symbology Encoding §11](https://www.ogc.org/standard/se/), reduced
//! to the literal parameters the software rasterizer supports.

use serde::{Deserialize, Serialize};

use crate::color::ColorValue;
use crate::sort::RuleOptions;

/// Stroke parameters for outlines and line geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeSymbolizer {
    /// Stroke color.
    pub color: ColorValue,
    /// Stroke width in pixels.
    #[serde(default = "default_stroke_width")]
    pub width: f32,
}

const fn default_stroke_width() -> f32 {
    1.0
}

/// Fill parameters for polygon geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSymbolizer {
    /// Interior fill color.
    pub fill: ColorValue,
    /// Optional outline drawn over the fill.
    #[serde(default)]
    pub stroke: Option<StrokeSymbolizer>,
}

/// Marker parameters for point geometries. Points paint as filled circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSymbolizer {
    /// Marker fill color.
    pub color: ColorValue,
    /// Marker diameter in pixels.
    #[serde(default = "default_marker_size")]
    pub size: f32,
}

const fn default_marker_size() -> f32 {
    6.0
}

/// How one layer's geometry is painted.
///
/// A layer carries exactly one symbolizer; the sink picks the sensible
/// interpretation when geometry and symbolizer family disagree (a line
/// styled with a fill strokes its path with the fill color).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Symbolizer {
    /// Filled polygons with optional outline.
    Fill(FillSymbolizer),
    /// Stroked line strings.
    Line(StrokeSymbolizer),
    /// Circular point markers.
    Marker(MarkerSymbolizer),
}

/// A layer's complete style: the symbolizer plus the loosely-typed rule
/// options (`sortBy`, `sortByGroup`) that are resolved to typed z-order
/// configuration at layer-assembly time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerStyle {
    /// How the geometry is painted, if at all. `None` paints nothing but
    /// still participates in ordering (useful in tests).
    pub symbolizer: Option<Symbolizer>,
    /// Raw rule options as written in the style document.
    pub options: RuleOptions,
}

impl LayerStyle {
    /// Style with a symbolizer and no rule options.
    #[must_use]
    pub fn with_symbolizer(symbolizer: Symbolizer) -> Self {
        Self {
            symbolizer: Some(symbolizer),
            options: RuleOptions::new(),
        }
    }

    /// Set a rule option, builder-style.
    #[must_use]
    pub fn option(mut self, key: &str, value: &str) -> Self {
        let _ = self.options.insert(key.to_string(), value.to_string());
        self
    }
}
