//! Ordered per-layer feature streams.

use inkmap_feature::{AttrValue, Feature};
use inkmap_source::{FeatureStream, SourceError};
use inkmap_style::SortKey;

use crate::error::ComposeError;
use crate::layer::{LayerDescriptor, LayerId};

/// A single layer's feature stream, opened with the sort pushed down to
/// the source, yielding each feature together with its extracted sort-key
/// values.
///
/// The stream is forward-only and lives for one render. Pulling past the
/// end is a driver bug and fails with [`ComposeError::StreamExhausted`]
/// instead of quietly yielding `None` forever.
pub struct OrderedFeatureStream {
    layer: LayerId,
    layer_name: String,
    sort: Option<SortKey>,
    inner: Box<dyn FeatureStream>,
    finished: bool,
}

impl OrderedFeatureStream {
    /// Open the layer's source, requesting delivery ordered by `sort`.
    ///
    /// # Errors
    ///
    /// [`ComposeError::UnsupportedOrdering`] if the source cannot honor
    /// the requested order (fatal; there is no unordered fallback), or
    /// [`ComposeError::Source`] if it fails to open at all.
    pub fn open(
        descriptor: &LayerDescriptor,
        layer: LayerId,
        sort: Option<&SortKey>,
    ) -> Result<Self, ComposeError> {
        let inner = descriptor.source.open(sort).map_err(|e| match e {
            SourceError::UnsupportedOrdering { key } => ComposeError::UnsupportedOrdering {
                layer: descriptor.name.clone(),
                key,
            },
            other => ComposeError::Source {
                layer: descriptor.name.clone(),
                source: other,
            },
        })?;
        Ok(Self {
            layer,
            layer_name: descriptor.name.clone(),
            sort: sort.cloned(),
            inner,
            finished: false,
        })
    }

    /// The layer slot this stream belongs to.
    #[must_use]
    pub const fn layer(&self) -> LayerId {
        self.layer
    }

    /// The layer's name, for error reports.
    #[must_use]
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// Pull the next feature with its sort-key values, or `None` once at
    /// the end of the stream.
    ///
    /// # Errors
    ///
    /// - [`ComposeError::AttributeResolution`] if a sort attribute is
    ///   missing on the feature - fatal, never a skip.
    /// - [`ComposeError::StreamExhausted`] if called again after `None`.
    /// - [`ComposeError::Source`] if the underlying source fails mid-read.
    pub fn next(&mut self) -> Result<Option<(Feature, Vec<AttrValue>)>, ComposeError> {
        if self.finished {
            return Err(ComposeError::StreamExhausted {
                layer: self.layer_name.clone(),
            });
        }
        let feature = self
            .inner
            .next_feature()
            .map_err(|source| ComposeError::Source {
                layer: self.layer_name.clone(),
                source,
            })?;
        match feature {
            None => {
                self.finished = true;
                Ok(None)
            }
            Some(feature) => {
                let key_values = self.extract_key_values(&feature)?;
                Ok(Some((feature, key_values)))
            }
        }
    }

    /// Extract the stream's sort-key values from a feature, in key order.
    fn extract_key_values(&self, feature: &Feature) -> Result<Vec<AttrValue>, ComposeError> {
        let Some(sort) = self.sort.as_ref() else {
            return Ok(Vec::new());
        };
        sort.entries
            .iter()
            .map(|entry| {
                feature.attr(&entry.attribute).cloned().ok_or_else(|| {
                    ComposeError::AttributeResolution {
                        layer: self.layer_name.clone(),
                        attribute: entry.attribute.clone(),
                        feature: feature.id.clone(),
                        reason: "attribute is missing".to_string(),
                    }
                })
            })
            .collect()
    }
}
