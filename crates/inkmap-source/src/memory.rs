//! In-memory feature source.
//!
//! Holds a `Vec<Feature>` behind an `Arc` and streams it lazily. Sort
//! pushdown is implemented by sorting a vector of *indices* at open time;
//! feature data is only cloned as each feature is yielded, so an open
//! stream costs one small index vector, not a copy of the layer.

use std::cmp::Ordering;
use std::sync::Arc;

use inkmap_feature::{AttrValue, Feature};
use inkmap_style::{SortKey, SortSpecEntry};

use crate::{FeatureSource, FeatureStream, SourceError};

/// A feature source over a vector of features.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    features: Arc<Vec<Feature>>,
    /// Whether the source will honor sort requests. The `unsorted`
    /// constructor turns this off to model a store with no sorting
    /// capability.
    sortable: bool,
}

impl MemorySource {
    /// Source that honors any sort request by sorting at open time.
    #[must_use]
    pub fn new(name: &str, features: Vec<Feature>) -> Self {
        Self {
            name: name.to_string(),
            features: Arc::new(features),
            sortable: true,
        }
    }

    /// Source that declines every sort request, modeling a store without
    /// sorting capability. Opening it with a sort key fails with
    /// [`SourceError::UnsupportedOrdering`].
    #[must_use]
    pub fn unsorted(name: &str, features: Vec<Feature>) -> Self {
        Self {
            sortable: false,
            ..Self::new(name, features)
        }
    }

    /// Number of features held by the source.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the source holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Sort-key values for one feature, `None` where an attribute is absent.
///
/// Absent values sort before present ones (nulls first), matching the
/// common database default. A feature with a missing sort attribute still
/// *streams*; it is the compositor's comparator that treats the missing
/// attribute as fatal, with the layer context only it knows.
fn key_values(feature: &Feature, entries: &[SortSpecEntry]) -> Vec<Option<AttrValue>> {
    entries
        .iter()
        .map(|entry| feature.attr(&entry.attribute).cloned())
        .collect()
}

fn compare_optional(key: &SortKey, a: &[Option<AttrValue>], b: &[Option<AttrValue>]) -> Ordering {
    for (entry, (va, vb)) in key.entries.iter().zip(a.iter().zip(b.iter())) {
        let ordering = match (va, vb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => entry.direction.apply(Ordering::Less),
            (Some(_), None) => entry.direction.apply(Ordering::Greater),
            // Incomparable pairs tie here; the compositor surfaces them.
            (Some(va), Some(vb)) => entry
                .direction
                .apply(va.compare(vb).unwrap_or(Ordering::Equal)),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

impl FeatureSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, sort: Option<&SortKey>) -> Result<Box<dyn FeatureStream>, SourceError> {
        let mut order: Vec<usize> = (0..self.features.len()).collect();
        if let Some(key) = sort {
            if !self.sortable {
                return Err(SourceError::UnsupportedOrdering {
                    key: key.to_string(),
                });
            }
            let keys: Vec<Vec<Option<AttrValue>>> = self
                .features
                .iter()
                .map(|f| key_values(f, &key.entries))
                .collect();
            // Stable sort keeps input order among equal keys, which is
            // what makes repeated renders bit-reproducible.
            order.sort_by(|&a, &b| compare_optional(key, &keys[a], &keys[b]));
        }
        Ok(Box::new(MemoryStream {
            features: Arc::clone(&self.features),
            order,
            cursor: 0,
        }))
    }
}

/// Lazy stream over a `MemorySource`'s features.
struct MemoryStream {
    features: Arc<Vec<Feature>>,
    order: Vec<usize>,
    cursor: usize,
}

impl FeatureStream for MemoryStream {
    fn next_feature(&mut self) -> Result<Option<Feature>, SourceError> {
        let Some(&index) = self.order.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(self.features[index].clone()))
    }
}
