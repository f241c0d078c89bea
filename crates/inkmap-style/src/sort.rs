//! `sortBy` / `sortByGroup` rule options.
//!
//! [GeoServer z-ordering](https://docs.geoserver.org/latest/en/user/styling/sld/extensions/z-order/)
//! defines the option grammar this module parses:
//!
//! > `sortBy`: "a comma separated list of attribute names, each followed by
//! > an optional direction specifier, A for ascending, D for descending"
//!
//! > `sortByGroup`: "an identifier; feature types sharing the same
//! > identifier enter a single cross-layer painting order"
//!
//! Rule options arrive as a loosely-typed string map. They are converted to
//! a typed [`ZOrderOptions`] exactly once, when layers are assembled for a
//! render, so every validation failure surfaces before the first paint
//! call.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumString};
use thiserror::Error;

use inkmap_common::warning::warn_once;
use inkmap_feature::AttrValue;

/// Rule option key carrying the sort specification.
pub const OPTION_SORT_BY: &str = "sortBy";

/// Rule option key carrying the merge group identifier.
pub const OPTION_SORT_BY_GROUP: &str = "sortByGroup";

/// String-keyed rule options as parsed from a style document.
pub type RuleOptions = HashMap<String, String>;

/// Errors raised while turning rule options into typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// A `sortBy` clause could not be parsed.
    #[error("invalid sortBy clause '{clause}': {reason}")]
    InvalidSortBy {
        /// The offending clause, as written in the style document.
        clause: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Sort direction for one attribute of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortDirection {
    /// Smallest value paints first.
    #[strum(serialize = "A", ascii_case_insensitive)]
    Ascending,
    /// Largest value paints first.
    #[strum(serialize = "D", ascii_case_insensitive)]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Apply the direction to a natural-order comparison result.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// One attribute of a sort key: name plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpecEntry {
    /// Attribute name, resolved against every feature of the stream.
    pub attribute: String,
    /// Direction applied to this attribute's comparison.
    pub direction: SortDirection,
}

/// An ordered list of (attribute, direction) pairs defining a total order
/// over features.
///
/// Comparison is lexicographic over the entries: the first entry dominates
/// and later entries break ties. Two sort keys are *equivalent* (and thus
/// `==`) only when they list the same attributes with the same directions
/// in the same order — a trailing extra attribute makes them different
/// keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// The entries, first entry dominant.
    pub entries: Vec<SortSpecEntry>,
}

impl SortKey {
    /// Parse a `sortBy` option value such as `"cat D, name"` or `"z"`.
    ///
    /// Each comma-separated clause is an attribute name followed by an
    /// optional direction token (`A` ascending — the default — or `D`
    /// descending, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidSortBy`] for an empty clause, an
    /// unknown direction token, or trailing garbage after the direction.
    pub fn parse(text: &str) -> Result<Self, StyleError> {
        let mut entries = Vec::new();
        for clause in text.split(',') {
            let clause = clause.trim();
            let mut parts = clause.split_whitespace();
            let Some(attribute) = parts.next() else {
                return Err(StyleError::InvalidSortBy {
                    clause: text.to_string(),
                    reason: "empty sort clause".to_string(),
                });
            };
            let direction = match parts.next() {
                None => SortDirection::Ascending,
                Some(token) => {
                    SortDirection::from_str(token).map_err(|_| StyleError::InvalidSortBy {
                        clause: clause.to_string(),
                        reason: format!("unknown direction '{token}' (expected A or D)"),
                    })?
                }
            };
            if let Some(extra) = parts.next() {
                return Err(StyleError::InvalidSortBy {
                    clause: clause.to_string(),
                    reason: format!("unexpected token '{extra}' after direction"),
                });
            }
            entries.push(SortSpecEntry {
                attribute: attribute.to_string(),
                direction,
            });
        }
        Ok(Self { entries })
    }

    /// The attribute names of the key, in order.
    #[must_use]
    pub fn attributes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.attribute.as_str()).collect()
    }

    /// Compare two already-extracted key value sequences under this key.
    ///
    /// Comparison is lexicographic: the first entry dominates, later
    /// entries break ties, and an all-entries tie is `Equal`. Both slices
    /// must carry one value per entry of the key, in entry order.
    ///
    /// Returns `None` when a value pair at some position has no natural
    /// ordering (cross-type values for the same attribute); the caller
    /// decides whether that is fatal. The core comparator treats it as an
    /// attribute resolution failure, never as "skip this feature".
    #[must_use]
    pub fn compare_values(&self, a: &[AttrValue], b: &[AttrValue]) -> Option<Ordering> {
        debug_assert_eq!(a.len(), self.entries.len());
        debug_assert_eq!(b.len(), self.entries.len());
        for (entry, (va, vb)) in self.entries.iter().zip(a.iter().zip(b.iter())) {
            let ordering = entry.direction.apply(va.compare(vb)?);
            if ordering != Ordering::Equal {
                return Some(ordering);
            }
        }
        Some(Ordering::Equal)
    }

    /// The same key with every direction flipped. Sorting by the reversed
    /// key yields exactly the reversed order for fully distinct values.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| SortSpecEntry {
                    attribute: e.attribute.clone(),
                    direction: e.direction.reversed(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", entry.attribute, entry.direction)?;
        }
        Ok(())
    }
}

/// Identifier marking which layers must be merged together for cross-layer
/// ordering. Layers carrying equal tokens merge; layers without a token
/// never merge with anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupToken(pub String);

impl fmt::Display for GroupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed z-order configuration extracted from a layer's rule options.
///
/// `sort_by: None` means the layer imposes no ordering constraint and
/// streams in natural source order; `group: None` means the layer renders
/// standalone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZOrderOptions {
    /// Requested feature ordering, pushed down to the source.
    pub sort_by: Option<SortKey>,
    /// Merge group membership.
    pub group: Option<GroupToken>,
}

impl ZOrderOptions {
    /// Extract typed z-order options from a loosely-typed rule option map.
    ///
    /// Unrecognized option keys are reported through
    /// [`warn_once`] and otherwise ignored, so a style
    /// written for a newer renderer still paints.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidSortBy`] when the `sortBy` value does
    /// not parse.
    pub fn from_options(options: &RuleOptions) -> Result<Self, StyleError> {
        for key in options.keys() {
            if key != OPTION_SORT_BY && key != OPTION_SORT_BY_GROUP {
                warn_once("Style", &format!("unrecognized rule option '{key}'"));
            }
        }
        let sort_by = options
            .get(OPTION_SORT_BY)
            .map(|text| SortKey::parse(text))
            .transpose()?;
        let group = options
            .get(OPTION_SORT_BY_GROUP)
            .map(|token| GroupToken(token.trim().to_string()));
        Ok(Self { sort_by, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        let key = SortKey::parse("cat D, name A").unwrap();
        assert_eq!(key.to_string(), "cat D, name A");
        assert_eq!(SortKey::parse(&key.to_string()).unwrap(), key);
    }

    #[test]
    fn group_token_keeps_inner_whitespace_trimmed() {
        let options: RuleOptions =
            [(OPTION_SORT_BY_GROUP.to_string(), " theGroup ".to_string())].into();
        let opts = ZOrderOptions::from_options(&options).unwrap();
        assert_eq!(opts.group, Some(GroupToken("theGroup".to_string())));
    }
}
