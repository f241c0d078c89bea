//! Layer descriptors and identities.

use inkmap_source::FeatureSource;
use inkmap_style::LayerStyle;

/// A layer's position in the render request's layer list.
///
/// Slot indices double as the deterministic tie-break for the k-way merge:
/// when two features compare equal under the group's sort key, the one
/// from the lower slot paints first, every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub usize);

/// One layer of a render request: a feature source plus the style that
/// paints it.
///
/// Descriptors are constructed once per render request and are immutable
/// for its duration; nothing about a render outlives the request.
pub struct LayerDescriptor {
    /// Layer name, used in every error and report this layer produces.
    pub name: String,
    /// Where the layer's features come from.
    pub source: Box<dyn FeatureSource>,
    /// How the layer is painted, including its z-order rule options.
    pub style: LayerStyle,
}

impl LayerDescriptor {
    /// Build a descriptor from its parts.
    #[must_use]
    pub fn new(name: &str, source: Box<dyn FeatureSource>, style: LayerStyle) -> Self {
        Self {
            name: name.to_string(),
            source,
            style,
        }
    }
}

impl std::fmt::Debug for LayerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerDescriptor")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("style", &self.style)
            .finish()
    }
}
