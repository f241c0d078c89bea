//! Layer assembly: partitioning layers into render units.
//!
//! Grouping is deliberately *not* global. Only consecutive layers whose
//! style authors marked them with the same `sortByGroup` token merge into
//! one cross-layer painting order; every other layer renders standalone,
//! paying no interleaving cost. This matches the
//! [GeoServer z-ordering](https://docs.geoserver.org/latest/en/user/styling/sld/extensions/z-order/)
//! model where most layers stack plainly and special sets (roads crossing
//! buildings) opt in.
//!
//! All validation happens here, eagerly: a group whose members disagree on
//! the sort key is a configuration error and must surface before any paint
//! side effect, not mid-merge after half a map is on the canvas.

use inkmap_style::{GroupToken, SortKey, ZOrderOptions};

use crate::error::ComposeError;
use crate::layer::{LayerDescriptor, LayerId};

/// Consecutive layers merged into one cross-layer painting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    /// The shared group token.
    pub token: GroupToken,
    /// The sort key every member stream is opened with.
    pub sort: SortKey,
    /// Member layer slots, in layer-list order. At least one.
    pub members: Vec<LayerId>,
}

/// One element of the assembled render plan, in painting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUnit {
    /// A layer rendered on its own, in its own order.
    Standalone {
        /// The layer's slot.
        layer: LayerId,
        /// The layer's own sort key, if it requested one.
        sort: Option<SortKey>,
    },
    /// A set of layers merged into one painting order.
    Merge(MergeGroup),
}

/// Partition the render request's layer list into render units.
///
/// Relative order is preserved: a merge group sits at the position of its
/// first member, and standalone layers keep their own positions.
///
/// # Errors
///
/// - [`ComposeError::Style`] if a layer's rule options fail to parse.
/// - [`ComposeError::IncompatibleGroupSort`] if grouped layers disagree on
///   the sort key. Equivalence is strict: same attributes, directions and
///   length. A member whose key merely adds a trailing tie-break attribute
///   is rejected rather than merged under a guessed policy.
pub fn assemble(layers: &[LayerDescriptor]) -> Result<Vec<RenderUnit>, ComposeError> {
    let mut resolved = Vec::with_capacity(layers.len());
    for descriptor in layers {
        let options =
            ZOrderOptions::from_options(&descriptor.style.options).map_err(|source| {
                ComposeError::Style {
                    layer: descriptor.name.clone(),
                    source,
                }
            })?;
        resolved.push(options);
    }

    let mut units: Vec<RenderUnit> = Vec::new();
    for (slot, options) in resolved.into_iter().enumerate() {
        let layer = LayerId(slot);
        let Some(token) = options.group else {
            units.push(RenderUnit::Standalone {
                layer,
                sort: options.sort_by,
            });
            continue;
        };

        // Merge into the previous unit only if it is a group with the
        // same token *and* immediately precedes this layer.
        if let Some(RenderUnit::Merge(group)) = units.last_mut() {
            let adjacent = group
                .members
                .last()
                .is_some_and(|last| last.0 + 1 == slot);
            if adjacent && group.token == token {
                validate_member(group, layer, options.sort_by.as_ref(), layers)?;
                group.members.push(layer);
                continue;
            }
        }

        let Some(sort) = options.sort_by else {
            return Err(ComposeError::IncompatibleGroupSort {
                group: token.to_string(),
                layer: layers[slot].name.clone(),
                detail: "is grouped but has no sortBy".to_string(),
            });
        };
        units.push(RenderUnit::Merge(MergeGroup {
            token,
            sort,
            members: vec![layer],
        }));
    }
    Ok(units)
}

fn validate_member(
    group: &MergeGroup,
    layer: LayerId,
    sort: Option<&SortKey>,
    layers: &[LayerDescriptor],
) -> Result<(), ComposeError> {
    let name = || layers[layer.0].name.clone();
    let Some(sort) = sort else {
        return Err(ComposeError::IncompatibleGroupSort {
            group: group.token.to_string(),
            layer: name(),
            detail: "is grouped but has no sortBy".to_string(),
        });
    };
    if *sort != group.sort {
        return Err(ComposeError::IncompatibleGroupSort {
            group: group.token.to_string(),
            layer: name(),
            detail: format!(
                "sorts by '{sort}' but the group sorts by '{}'",
                group.sort
            ),
        });
    }
    Ok(())
}
