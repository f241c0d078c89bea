//! Integration tests for sortBy / sortByGroup option parsing.

use std::cmp::Ordering;

use inkmap_feature::AttrValue;
use inkmap_style::{
    GroupToken, RuleOptions, SortDirection, SortKey, StyleError, ZOrderOptions,
};

fn entry(key: &SortKey, i: usize) -> (&str, SortDirection) {
    let e = &key.entries[i];
    (e.attribute.as_str(), e.direction)
}

#[test]
fn test_single_attribute_defaults_ascending() {
    let key = SortKey::parse("z").unwrap();
    assert_eq!(key.entries.len(), 1);
    assert_eq!(entry(&key, 0), ("z", SortDirection::Ascending));
}

#[test]
fn test_single_attribute_descending() {
    let key = SortKey::parse("z D").unwrap();
    assert_eq!(entry(&key, 0), ("z", SortDirection::Descending));
}

#[test]
fn test_two_attributes_no_space_after_comma() {
    let key = SortKey::parse("cat D,z D").unwrap();
    assert_eq!(key.entries.len(), 2);
    assert_eq!(entry(&key, 0), ("cat", SortDirection::Descending));
    assert_eq!(entry(&key, 1), ("z", SortDirection::Descending));
}

#[test]
fn test_two_attributes_with_space_after_comma() {
    let key = SortKey::parse("cat D, name D").unwrap();
    assert_eq!(entry(&key, 0), ("cat", SortDirection::Descending));
    assert_eq!(entry(&key, 1), ("name", SortDirection::Descending));
}

#[test]
fn test_mixed_directions() {
    let key = SortKey::parse("cat D, z A").unwrap();
    assert_eq!(entry(&key, 0), ("cat", SortDirection::Descending));
    assert_eq!(entry(&key, 1), ("z", SortDirection::Ascending));
}

#[test]
fn test_direction_is_case_insensitive() {
    let key = SortKey::parse("z d, cat a").unwrap();
    assert_eq!(entry(&key, 0), ("z", SortDirection::Descending));
    assert_eq!(entry(&key, 1), ("cat", SortDirection::Ascending));
}

#[test]
fn test_extra_whitespace_is_tolerated() {
    let key = SortKey::parse("  cat   D ,  z  ").unwrap();
    assert_eq!(entry(&key, 0), ("cat", SortDirection::Descending));
    assert_eq!(entry(&key, 1), ("z", SortDirection::Ascending));
}

#[test]
fn test_empty_clause_is_rejected() {
    assert!(matches!(
        SortKey::parse("z,,cat"),
        Err(StyleError::InvalidSortBy { .. })
    ));
    assert!(matches!(
        SortKey::parse(""),
        Err(StyleError::InvalidSortBy { .. })
    ));
    assert!(matches!(
        SortKey::parse("z,"),
        Err(StyleError::InvalidSortBy { .. })
    ));
}

#[test]
fn test_unknown_direction_is_rejected() {
    let err = SortKey::parse("z X").unwrap_err();
    let StyleError::InvalidSortBy { reason, .. } = err;
    assert!(reason.contains('X'), "reason should name the token: {reason}");
}

#[test]
fn test_trailing_token_is_rejected() {
    assert!(SortKey::parse("z D extra").is_err());
}

#[test]
fn test_reversal_flips_every_direction() {
    let key = SortKey::parse("cat D, z A").unwrap();
    let reversed = key.reversed();
    assert_eq!(entry(&reversed, 0), ("cat", SortDirection::Ascending));
    assert_eq!(entry(&reversed, 1), ("z", SortDirection::Descending));
    // Reversal is an involution.
    assert_eq!(reversed.reversed(), key);
}

#[test]
fn test_equivalence_requires_same_length() {
    // One trailing tie-break attribute makes the keys different; grouped
    // layers carrying these two keys must be rejected, not merged.
    let short = SortKey::parse("cat D").unwrap();
    let long = SortKey::parse("cat D, name A").unwrap();
    assert_ne!(short, long);
}

#[test]
fn test_compare_values_first_entry_dominates() {
    let key = SortKey::parse("cat D, z A").unwrap();
    let a = [AttrValue::Int(2), AttrValue::Int(10)];
    let b = [AttrValue::Int(1), AttrValue::Int(5)];
    // cat is descending, so cat=2 sorts before cat=1 regardless of z.
    assert_eq!(key.compare_values(&a, &b), Some(Ordering::Less));
}

#[test]
fn test_compare_values_ties_fall_through() {
    let key = SortKey::parse("cat D, z A").unwrap();
    let a = [AttrValue::Int(1), AttrValue::Int(5)];
    let b = [AttrValue::Int(1), AttrValue::Int(10)];
    assert_eq!(key.compare_values(&a, &b), Some(Ordering::Less));
    assert_eq!(key.compare_values(&a, &a), Some(Ordering::Equal));
}

#[test]
fn test_direction_reversal_inverts_strict_orderings() {
    let ascending = SortKey::parse("z").unwrap();
    let descending = ascending.reversed();
    let a = [AttrValue::Int(1)];
    let b = [AttrValue::Int(2)];
    assert_eq!(ascending.compare_values(&a, &b), Some(Ordering::Less));
    assert_eq!(descending.compare_values(&b, &a), Some(Ordering::Less));
}

#[test]
fn test_compare_values_cross_type_is_none() {
    let key = SortKey::parse("z").unwrap();
    let a = [AttrValue::Int(1)];
    let b = [AttrValue::Str("1".to_string())];
    assert_eq!(key.compare_values(&a, &b), None);
}

#[test]
fn test_options_extraction() {
    let mut options = RuleOptions::new();
    let _ = options.insert("sortBy".to_string(), "z D".to_string());
    let _ = options.insert("sortByGroup".to_string(), "theGroup".to_string());

    let opts = ZOrderOptions::from_options(&options).unwrap();
    assert_eq!(opts.sort_by, Some(SortKey::parse("z D").unwrap()));
    assert_eq!(opts.group, Some(GroupToken("theGroup".to_string())));
}

#[test]
fn test_absent_options_mean_no_constraint() {
    let opts = ZOrderOptions::from_options(&RuleOptions::new()).unwrap();
    assert_eq!(opts.sort_by, None);
    assert_eq!(opts.group, None);
}

#[test]
fn test_bad_sort_by_fails_extraction() {
    let mut options = RuleOptions::new();
    let _ = options.insert("sortBy".to_string(), "z Q".to_string());
    assert!(ZOrderOptions::from_options(&options).is_err());
}
