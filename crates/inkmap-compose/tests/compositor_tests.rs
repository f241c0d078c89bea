//! Integration tests for the ordered multi-layer compositor.
//!
//! The scenarios mirror classic z-order rendering cases: a single layer
//! sorted ascending and descending, a two-key sort, grouped layers whose
//! features interleave on a shared attribute, and ungrouped layers that
//! paint as contiguous blocks.

use std::cell::RefCell;
use std::rc::Rc;

use inkmap_compose::{
    CancelFlag, ComposeError, LayerDescriptor, LayerId, OrderedFeatureStream, PaintFailure,
    RenderListener, RenderSink, RenderUnit, SinkError, ZOrderCompositor,
};
use inkmap_feature::{AttrValue, AttributesMap, Feature, Geometry, ScreenPos};
use inkmap_source::{FeatureSource, FeatureStream, MemorySource, SourceError};
use inkmap_style::LayerStyle;

/// A point feature with integer attributes.
fn feature(id: &str, attrs: &[(&str, i64)]) -> Feature {
    let mut map = AttributesMap::new();
    for (name, value) in attrs {
        let _ = map.insert((*name).to_string(), AttrValue::Int(*value));
    }
    Feature::new(
        id.to_string(),
        Geometry::Point(ScreenPos::new(0.0, 0.0)),
        map,
    )
}

/// A layer over an in-memory source with the given rule options.
fn layer(name: &str, features: Vec<Feature>, options: &[(&str, &str)]) -> LayerDescriptor {
    let mut style = LayerStyle::default();
    for (key, value) in options {
        style = style.option(key, value);
    }
    LayerDescriptor::new(name, Box::new(MemorySource::new(name, features)), style)
}

/// Records `(layer, feature)` per paint call; fails ids listed in
/// `fail_ids`.
#[derive(Default)]
struct RecordingSink {
    dispatched: Vec<(String, String)>,
    fail_ids: Vec<String>,
}

impl RenderSink for RecordingSink {
    fn paint(&mut self, layer: &LayerDescriptor, feature: &Feature) -> Result<(), SinkError> {
        self.dispatched
            .push((layer.name.clone(), feature.id.clone()));
        if self.fail_ids.contains(&feature.id) {
            return Err(SinkError::new(format!("refused to paint '{}'", feature.id)));
        }
        Ok(())
    }
}

fn render_ids(layers: &[LayerDescriptor]) -> Vec<String> {
    let mut sink = RecordingSink::default();
    let mut compositor = ZOrderCompositor::new(layers).unwrap();
    let report = compositor.render(&mut sink).unwrap();
    assert!(report.is_clean());
    sink.dispatched.into_iter().map(|(_, id)| id).collect()
}

#[test]
fn test_single_layer_z_ascending() {
    let layers = vec![layer(
        "squares",
        vec![
            feature("z3", &[("z", 3)]),
            feature("z1", &[("z", 1)]),
            feature("z2", &[("z", 2)]),
        ],
        &[("sortBy", "z")],
    )];
    assert_eq!(render_ids(&layers), vec!["z1", "z2", "z3"]);
}

#[test]
fn test_single_layer_z_descending_is_exact_reverse() {
    let features = vec![
        feature("z3", &[("z", 3)]),
        feature("z1", &[("z", 1)]),
        feature("z2", &[("z", 2)]),
    ];
    let ascending = render_ids(&[layer("squares", features.clone(), &[("sortBy", "z")])]);
    let descending = render_ids(&[layer("squares", features, &[("sortBy", "z D")])]);
    let mut reversed = ascending;
    reversed.reverse();
    assert_eq!(descending, reversed);
}

#[test]
fn test_two_key_sort_cat_desc_z_asc() {
    let layers = vec![layer(
        "squares",
        vec![
            feature("c1z10", &[("cat", 1), ("z", 10)]),
            feature("c2z20", &[("cat", 2), ("z", 20)]),
            feature("c1z20", &[("cat", 1), ("z", 20)]),
            feature("c2z10", &[("cat", 2), ("z", 10)]),
        ],
        &[("sortBy", "cat D, z A")],
    )];
    // All cat=2 before all cat=1; within each cat, z ascending.
    assert_eq!(
        render_ids(&layers),
        vec!["c2z10", "c2z20", "c1z10", "c1z20"]
    );
}

#[test]
fn test_grouped_layers_interleave_on_shared_key() {
    let layers = vec![
        layer(
            "roads",
            vec![feature("road-z1", &[("z", 1)]), feature("road-z10", &[("z", 10)])],
            &[("sortBy", "z"), ("sortByGroup", "theGroup")],
        ),
        layer(
            "buildings",
            vec![feature("building-z5", &[("z", 5)])],
            &[("sortBy", "z"), ("sortByGroup", "theGroup")],
        ),
    ];
    // The building dispatches strictly between the two roads.
    assert_eq!(
        render_ids(&layers),
        vec!["road-z1", "building-z5", "road-z10"]
    );
}

#[test]
fn test_ungrouped_layers_paint_as_contiguous_blocks() {
    let layers = vec![
        layer(
            "roads",
            vec![feature("road-z1", &[("z", 1)]), feature("road-z10", &[("z", 10)])],
            &[("sortBy", "z")],
        ),
        layer(
            "buildings",
            vec![feature("building-z5", &[("z", 5)])],
            &[("sortBy", "z")],
        ),
    ];
    // No shared group token: layer-list order wins over z values.
    assert_eq!(
        render_ids(&layers),
        vec!["road-z1", "road-z10", "building-z5"]
    );
}

#[test]
fn test_different_group_tokens_do_not_interleave() {
    let layers = vec![
        layer(
            "roads",
            vec![feature("road-z10", &[("z", 10)])],
            &[("sortBy", "z"), ("sortByGroup", "groupA")],
        ),
        layer(
            "buildings",
            vec![feature("building-z5", &[("z", 5)])],
            &[("sortBy", "z"), ("sortByGroup", "groupB")],
        ),
    ];
    assert_eq!(render_ids(&layers), vec!["road-z10", "building-z5"]);
}

#[test]
fn test_group_broken_by_ungrouped_layer_in_between() {
    let layers = vec![
        layer(
            "a",
            vec![feature("a-z10", &[("z", 10)])],
            &[("sortBy", "z"), ("sortByGroup", "theGroup")],
        ),
        layer("plain", vec![feature("plain", &[])], &[]),
        layer(
            "b",
            vec![feature("b-z1", &[("z", 1)])],
            &[("sortBy", "z"), ("sortByGroup", "theGroup")],
        ),
    ];
    // Grouping only merges *consecutive* layers; the plain layer splits
    // the token into two independent groups.
    let compositor = ZOrderCompositor::new(&layers).unwrap();
    assert_eq!(compositor.units().len(), 3);
    assert_eq!(render_ids(&layers), vec!["a-z10", "plain", "b-z1"]);
}

#[test]
fn test_merge_group_sits_at_first_member_position() {
    let layers = vec![
        layer("base", vec![feature("base", &[])], &[]),
        layer(
            "roads",
            vec![feature("road", &[("z", 1)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
        layer(
            "buildings",
            vec![feature("building", &[("z", 2)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
        layer("labels", vec![feature("label", &[])], &[]),
    ];
    let compositor = ZOrderCompositor::new(&layers).unwrap();
    let units = compositor.units();
    assert_eq!(units.len(), 3);
    assert!(matches!(
        &units[0],
        RenderUnit::Standalone { layer: LayerId(0), .. }
    ));
    let RenderUnit::Merge(group) = &units[1] else {
        panic!("expected a merge group at position 1");
    };
    assert_eq!(group.members, vec![LayerId(1), LayerId(2)]);
    assert!(matches!(
        &units[2],
        RenderUnit::Standalone { layer: LayerId(3), .. }
    ));
}

#[test]
fn test_tie_break_prefers_earlier_layer_and_is_stable() {
    let layers = vec![
        layer(
            "first",
            vec![feature("first-a", &[("z", 5)]), feature("first-b", &[("z", 5)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
        layer(
            "second",
            vec![feature("second-a", &[("z", 5)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
    ];
    let first = render_ids(&layers);
    assert_eq!(first, vec!["first-a", "first-b", "second-a"]);
    // Bit-reproducible: repeated renders of unchanged data dispatch in
    // the same order.
    for _ in 0..5 {
        assert_eq!(render_ids(&layers), first);
    }
}

#[test]
fn test_empty_member_streams_are_harmless() {
    let layers = vec![
        layer("empty", Vec::new(), &[("sortBy", "z"), ("sortByGroup", "g")]),
        layer(
            "full",
            vec![feature("only", &[("z", 1)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
    ];
    assert_eq!(render_ids(&layers), vec!["only"]);
}

#[test]
fn test_incompatible_group_directions_fail_at_assembly() {
    let layers = vec![
        layer("a", Vec::new(), &[("sortBy", "z"), ("sortByGroup", "g")]),
        layer("b", Vec::new(), &[("sortBy", "z D"), ("sortByGroup", "g")]),
    ];
    let err = ZOrderCompositor::new(&layers).unwrap_err();
    assert!(matches!(err, ComposeError::IncompatibleGroupSort { .. }));
}

#[test]
fn test_trailing_tie_break_attribute_is_incompatible() {
    // A key that merely adds a trailing attribute is rejected, not merged
    // under some lenient policy.
    let layers = vec![
        layer("a", Vec::new(), &[("sortBy", "cat D"), ("sortByGroup", "g")]),
        layer(
            "b",
            Vec::new(),
            &[("sortBy", "cat D, name A"), ("sortByGroup", "g")],
        ),
    ];
    assert!(matches!(
        ZOrderCompositor::new(&layers).unwrap_err(),
        ComposeError::IncompatibleGroupSort { .. }
    ));
}

#[test]
fn test_grouped_layer_without_sort_key_is_rejected() {
    let layers = vec![layer("a", Vec::new(), &[("sortByGroup", "g")])];
    assert!(matches!(
        ZOrderCompositor::new(&layers).unwrap_err(),
        ComposeError::IncompatibleGroupSort { .. }
    ));
}

#[test]
fn test_assembly_failure_precedes_all_paint_calls() {
    let layers = vec![
        layer("painted", vec![feature("f", &[])], &[]),
        layer("a", Vec::new(), &[("sortBy", "z"), ("sortByGroup", "g")]),
        layer("b", Vec::new(), &[("sortBy", "z D"), ("sortByGroup", "g")]),
    ];
    // The error surfaces at construction; no sink ever sees a feature.
    assert!(ZOrderCompositor::new(&layers).is_err());
}

#[test]
fn test_missing_sort_attribute_aborts_the_render() {
    let layers = vec![layer(
        "squares",
        vec![feature("good", &[("z", 1)]), feature("bad", &[("other", 2)])],
        &[("sortBy", "z")],
    )];
    let mut sink = RecordingSink::default();
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let err = compositor.render(&mut sink).unwrap_err();
    let ComposeError::AttributeResolution {
        layer: layer_name,
        attribute,
        feature: feature_id,
        ..
    } = err
    else {
        panic!("expected attribute resolution error");
    };
    assert_eq!(layer_name, "squares");
    assert_eq!(attribute, "z");
    assert_eq!(feature_id, "bad");
}

#[test]
fn test_unsupported_ordering_aborts_the_render() {
    let source = MemorySource::unsorted("nosort", vec![feature("f", &[("z", 1)])]);
    let style = LayerStyle::default().option("sortBy", "z");
    let layers = vec![LayerDescriptor::new("nosort", Box::new(source), style)];
    let mut sink = RecordingSink::default();
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let err = compositor.render(&mut sink).unwrap_err();
    assert!(matches!(err, ComposeError::UnsupportedOrdering { .. }));
    assert!(sink.dispatched.is_empty());
}

#[test]
fn test_sink_failure_does_not_stop_the_merge() {
    let layers = vec![layer(
        "squares",
        vec![
            feature("z1", &[("z", 1)]),
            feature("z2", &[("z", 2)]),
            feature("z3", &[("z", 3)]),
        ],
        &[("sortBy", "z")],
    )];
    let mut sink = RecordingSink {
        fail_ids: vec!["z2".to_string()],
        ..RecordingSink::default()
    };
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let report = compositor.render(&mut sink).unwrap();
    assert_eq!(report.painted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].feature, "z2");
    // The failed feature was attempted and the rest still painted.
    let ids: Vec<&str> = sink.dispatched.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(ids, vec!["z1", "z2", "z3"]);
}

#[test]
fn test_render_is_idempotent() {
    let build = || {
        vec![
            layer(
                "roads",
                vec![feature("r1", &[("z", 3)]), feature("r2", &[("z", 1)])],
                &[("sortBy", "z"), ("sortByGroup", "g")],
            ),
            layer(
                "buildings",
                vec![feature("b1", &[("z", 2)])],
                &[("sortBy", "z"), ("sortByGroup", "g")],
            ),
        ]
    };
    let first = render_ids(&build());
    let second = render_ids(&build());
    assert_eq!(first, second);
    assert_eq!(first, vec!["r2", "b1", "r1"]);
}

#[test]
fn test_stream_exhaustion_is_a_contract_violation() {
    let layers = vec![layer("squares", vec![feature("f", &[("z", 1)])], &[])];
    let mut stream = OrderedFeatureStream::open(&layers[0], LayerId(0), None).unwrap();
    assert!(stream.next().unwrap().is_some());
    assert!(stream.next().unwrap().is_none());
    // Pulling past the end is a driver bug, not a quiet no-op.
    assert!(matches!(
        stream.next().unwrap_err(),
        ComposeError::StreamExhausted { .. }
    ));
}

/// Counts how many pulled features have not yet been painted, tracking
/// the high-water mark.
#[derive(Clone, Default)]
struct Counters(Rc<RefCell<(usize, usize)>>);

impl Counters {
    fn pulled(&self) {
        let mut state = self.0.borrow_mut();
        state.0 += 1;
        state.1 = state.1.max(state.0);
    }

    fn painted(&self) {
        self.0.borrow_mut().0 -= 1;
    }

    fn high_water_mark(&self) -> usize {
        self.0.borrow().1
    }
}

struct CountingSource {
    inner: MemorySource,
    counters: Counters,
}

impl FeatureSource for CountingSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(
        &self,
        sort: Option<&inkmap_style::SortKey>,
    ) -> Result<Box<dyn FeatureStream>, SourceError> {
        Ok(Box::new(CountingStream {
            inner: self.inner.open(sort)?,
            counters: self.counters.clone(),
        }))
    }
}

struct CountingStream {
    inner: Box<dyn FeatureStream>,
    counters: Counters,
}

impl FeatureStream for CountingStream {
    fn next_feature(&mut self) -> Result<Option<Feature>, SourceError> {
        let next = self.inner.next_feature()?;
        if next.is_some() {
            self.counters.pulled();
        }
        Ok(next)
    }
}

struct CountingSink {
    counters: Counters,
}

impl RenderSink for CountingSink {
    fn paint(&mut self, _layer: &LayerDescriptor, _feature: &Feature) -> Result<(), SinkError> {
        self.counters.painted();
        Ok(())
    }
}

#[test]
fn test_merge_buffers_at_most_one_feature_per_stream() {
    let counters = Counters::default();
    let per_layer = 200;
    let make_layer = |name: &str, offset: i64| {
        let features = (0..per_layer)
            .map(|i| feature(&format!("{name}-{i}"), &[("z", i * 2 + offset)]))
            .collect();
        let source = CountingSource {
            inner: MemorySource::new(name, features),
            counters: counters.clone(),
        };
        LayerDescriptor::new(
            name,
            Box::new(source),
            LayerStyle::default()
                .option("sortBy", "z")
                .option("sortByGroup", "g"),
        )
    };
    let layers = vec![make_layer("even", 0), make_layer("odd", 1)];
    let mut sink = CountingSink {
        counters: counters.clone(),
    };
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let report = compositor.render(&mut sink).unwrap();
    assert_eq!(report.painted, 400);
    // Two grouped layers: never more than two features buffered at once,
    // no matter how many features each layer streams.
    assert!(
        counters.high_water_mark() <= 2,
        "high water mark {} exceeds layer count",
        counters.high_water_mark()
    );
}

struct CancellingSink {
    painted: usize,
    cancel_after: usize,
    flag: CancelFlag,
}

impl RenderSink for CancellingSink {
    fn paint(&mut self, _layer: &LayerDescriptor, _feature: &Feature) -> Result<(), SinkError> {
        self.painted += 1;
        if self.painted == self.cancel_after {
            self.flag.cancel();
        }
        Ok(())
    }
}

#[test]
fn test_cancellation_stops_between_dispatches() {
    let layers = vec![layer(
        "squares",
        (0..10).map(|i| feature(&format!("f{i}"), &[("z", i)])).collect(),
        &[("sortBy", "z")],
    )];
    let flag = CancelFlag::new();
    let mut sink = CancellingSink {
        painted: 0,
        cancel_after: 3,
        flag: flag.clone(),
    };
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let report = compositor.render_cancellable(&mut sink, &flag).unwrap();
    assert!(report.cancelled);
    // Partial output is expected from a cancelled render.
    assert_eq!(report.painted, 3);
    assert_eq!(sink.painted, 3);
}

#[derive(Default)]
struct CollectingListener {
    rendered: Vec<String>,
    failures: Vec<String>,
}

struct SharedListener(Rc<RefCell<CollectingListener>>);

impl RenderListener for SharedListener {
    fn feature_rendered(&mut self, _layer: &str, feature: &Feature) {
        self.0.borrow_mut().rendered.push(feature.id.clone());
    }

    fn error_occurred(&mut self, failure: &PaintFailure) {
        self.0.borrow_mut().failures.push(failure.feature.clone());
    }
}

#[test]
fn test_listener_sees_every_dispatch_and_failure() {
    let layers = vec![layer(
        "squares",
        vec![feature("z1", &[("z", 1)]), feature("z2", &[("z", 2)])],
        &[("sortBy", "z")],
    )];
    let listener = Rc::new(RefCell::new(CollectingListener::default()));
    let mut sink = RecordingSink {
        fail_ids: vec!["z2".to_string()],
        ..RecordingSink::default()
    };
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    compositor.add_listener(Box::new(SharedListener(Rc::clone(&listener))));
    let report = compositor.render(&mut sink).unwrap();
    assert_eq!(report.painted, 1);
    assert_eq!(listener.borrow().rendered, vec!["z1"]);
    assert_eq!(listener.borrow().failures, vec!["z2"]);
}

#[test]
fn test_cross_type_sort_values_abort_the_render() {
    let mut map = AttributesMap::new();
    let _ = map.insert("z".to_string(), AttrValue::Str("ten".to_string()));
    let stringy = Feature::new(
        "stringy".to_string(),
        Geometry::Point(ScreenPos::new(0.0, 0.0)),
        map,
    );
    let layers = vec![
        layer(
            "ints",
            vec![feature("int-z", &[("z", 1)])],
            &[("sortBy", "z"), ("sortByGroup", "g")],
        ),
        LayerDescriptor::new(
            "strings",
            Box::new(MemorySource::new("strings", vec![stringy])),
            LayerStyle::default()
                .option("sortBy", "z")
                .option("sortByGroup", "g"),
        ),
    ];
    let mut sink = RecordingSink::default();
    let mut compositor = ZOrderCompositor::new(&layers).unwrap();
    let err = compositor.render(&mut sink).unwrap_err();
    assert!(matches!(err, ComposeError::AttributeResolution { .. }));
}
