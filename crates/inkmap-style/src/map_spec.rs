//! The serde map document consumed by the CLI.
//!
//! A map document lists the canvas, then the layers bottom-to-top. Layer
//! order is painting order except where `sortByGroup` merges consecutive
//! layers into a single cross-layer order.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::ColorValue;
use crate::sort::RuleOptions;
use crate::symbolizer::Symbolizer;

/// A complete renderable map description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSpec {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Canvas background color. Defaults to white, like a paper map.
    #[serde(default = "default_background")]
    pub background: ColorValue,
    /// Layers in list order, bottom-most first.
    pub layers: Vec<LayerSpec>,
}

const fn default_background() -> ColorValue {
    ColorValue::WHITE
}

/// One layer of a map document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Layer name, used in error reports and the render summary.
    pub name: String,
    /// Path to the layer's property file, relative to the map document.
    pub source: PathBuf,
    /// How the layer's geometry is painted.
    pub symbolizer: Symbolizer,
    /// Rule options (`sortBy`, `sortByGroup`).
    #[serde(default)]
    pub options: RuleOptions,
}
