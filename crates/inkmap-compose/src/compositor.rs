//! The k-way merge compositor and its sink/listener traits.
//!
//! The compositor walks the assembled render plan in order. A standalone
//! layer just drains its ordered stream. A merge group of N layers runs a
//! classic k-way merge: one "current head" per stream, repeatedly dispatch
//! the least head under the group's sort key, advance only that stream.
//! Head selection is a linear scan - N is the number of *layers* in the
//! group, which is small even when per-layer feature counts are not, so a
//! priority queue would buy nothing but code.
//!
//! The dispatch sequence is fully determined by the data and the style:
//! equal keys fall back to layer slot order, and each source's stable
//! pushdown sort fixes the order within a stream, so repeated renders of
//! unchanged data are bit-reproducible.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use inkmap_feature::{AttrValue, Feature};
use inkmap_style::SortKey;

use crate::assembly::{MergeGroup, RenderUnit, assemble};
use crate::error::{ComposeError, SinkError};
use crate::layer::{LayerDescriptor, LayerId};
use crate::stream::OrderedFeatureStream;

/// The painting side of the compositor: receives one feature at a time,
/// in final draw order.
///
/// A sink reports per-feature failures and nothing else; whether rendering
/// continues after a failure is the compositor's policy (it does).
pub trait RenderSink {
    /// Paint one feature of `layer`.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if this feature could not be painted. The
    /// compositor records the failure and continues with the next feature.
    fn paint(&mut self, layer: &LayerDescriptor, feature: &Feature) -> Result<(), SinkError>;
}

/// Observer of render progress, notified per dispatched feature and per
/// recoverable paint failure.
pub trait RenderListener {
    /// Called after a feature was painted successfully.
    fn feature_rendered(&mut self, layer: &str, feature: &Feature) {
        let _ = (layer, feature);
    }

    /// Called when a feature failed to paint. The render continues.
    fn error_occurred(&mut self, failure: &PaintFailure) {
        let _ = failure;
    }
}

/// A recoverable paint failure, reported alongside the partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintFailure {
    /// Layer whose feature failed to paint.
    pub layer: String,
    /// Identifier of the feature that failed.
    pub feature: String,
    /// What the sink reported.
    pub error: SinkError,
}

/// Outcome of a render request that did not hit a fatal error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Number of features painted successfully.
    pub painted: usize,
    /// Whether the render stopped early because it was cancelled.
    /// Partial canvas output from a cancelled render is expected, not an
    /// error.
    pub cancelled: bool,
    /// Recoverable paint failures, in dispatch order.
    pub failures: Vec<PaintFailure>,
}

impl RenderReport {
    /// Whether the render completed with no failures and no cancellation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

/// Cooperative cancellation flag for a render request.
///
/// Cheap to clone and share; the compositor checks it between any two
/// dispatched features and stops promptly, releasing all open streams.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the render holding this flag.
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// Drives a render request: assembles the layer list into a plan at
/// construction, then merges and dispatches features to a sink on
/// [`render`](Self::render).
///
/// One compositor drives one render request and owns all transient merge
/// state (open streams, buffered heads). Independent render requests use
/// independent compositor instances; nothing is shared between them.
pub struct ZOrderCompositor<'a> {
    layers: &'a [LayerDescriptor],
    units: Vec<RenderUnit>,
    listeners: Vec<Box<dyn RenderListener + 'a>>,
}

impl std::fmt::Debug for ZOrderCompositor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZOrderCompositor")
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

impl<'a> ZOrderCompositor<'a> {
    /// Assemble the layer list into a render plan.
    ///
    /// # Errors
    ///
    /// Fails with [`ComposeError::Style`] or
    /// [`ComposeError::IncompatibleGroupSort`] before any stream is opened
    /// or any feature painted.
    pub fn new(layers: &'a [LayerDescriptor]) -> Result<Self, ComposeError> {
        Ok(Self {
            layers,
            units: assemble(layers)?,
            listeners: Vec::new(),
        })
    }

    /// Register a progress listener for this render.
    pub fn add_listener(&mut self, listener: Box<dyn RenderListener + 'a>) {
        self.listeners.push(listener);
    }

    /// The assembled render plan, in painting order.
    #[must_use]
    pub fn units(&self) -> &[RenderUnit] {
        &self.units
    }

    /// Render everything to `sink`, never cancelling.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ComposeError`]; recoverable sink failures
    /// are collected in the [`RenderReport`] instead.
    pub fn render(&mut self, sink: &mut dyn RenderSink) -> Result<RenderReport, ComposeError> {
        self.render_cancellable(sink, &CancelFlag::new())
    }

    /// Render everything to `sink`, stopping promptly once `cancel` is
    /// raised.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ComposeError`]; recoverable sink failures
    /// are collected in the [`RenderReport`] instead.
    pub fn render_cancellable(
        &mut self,
        sink: &mut dyn RenderSink,
        cancel: &CancelFlag,
    ) -> Result<RenderReport, ComposeError> {
        let mut report = RenderReport::default();
        for unit in self.units.clone() {
            if report.cancelled {
                break;
            }
            match unit {
                RenderUnit::Standalone { layer, sort } => {
                    self.render_standalone(layer, sort.as_ref(), sink, cancel, &mut report)?;
                }
                RenderUnit::Merge(group) => {
                    self.render_group(&group, sink, cancel, &mut report)?;
                }
            }
        }
        Ok(report)
    }

    /// Drain one standalone layer in its own order.
    fn render_standalone(
        &mut self,
        layer: LayerId,
        sort: Option<&SortKey>,
        sink: &mut dyn RenderSink,
        cancel: &CancelFlag,
        report: &mut RenderReport,
    ) -> Result<(), ComposeError> {
        let layers = self.layers;
        let mut stream = OrderedFeatureStream::open(&layers[layer.0], layer, sort)?;
        while let Some((feature, _)) = stream.next()? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(());
            }
            self.dispatch(layer, &feature, sink, report);
        }
        Ok(())
    }

    /// Merge the group's streams into one dispatch order.
    fn render_group(
        &mut self,
        group: &MergeGroup,
        sink: &mut dyn RenderSink,
        cancel: &CancelFlag,
        report: &mut RenderReport,
    ) -> Result<(), ComposeError> {
        let layers = self.layers;
        let mut cursors = Vec::with_capacity(group.members.len());
        for &member in &group.members {
            let stream = OrderedFeatureStream::open(&layers[member.0], member, Some(&group.sort))?;
            cursors.push(Cursor {
                stream,
                head: None,
                done: false,
            });
        }

        loop {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(());
            }

            // Refill: by construction, at most one buffered feature per
            // stream exists at any instant.
            for cursor in &mut cursors {
                if cursor.head.is_none() && !cursor.done {
                    match cursor.stream.next()? {
                        Some(head) => cursor.head = Some(head),
                        None => cursor.done = true,
                    }
                }
            }

            // Select the least head. A strict less-than keeps the earlier
            // slot on ties, which is the deterministic tie-break rule.
            let mut best: Option<usize> = None;
            for (i, cursor) in cursors.iter().enumerate() {
                if cursor.head.is_none() {
                    continue;
                }
                best = Some(match best {
                    None => i,
                    Some(b) => {
                        if head_less_than(&group.sort, cursor, &cursors[b])? {
                            i
                        } else {
                            b
                        }
                    }
                });
            }

            let Some(winner) = best else {
                return Ok(());
            };
            let Some((feature, _)) = cursors[winner].head.take() else {
                return Ok(());
            };
            let layer = cursors[winner].stream.layer();
            self.dispatch(layer, &feature, sink, report);
        }
    }

    /// Hand one feature to the sink and fan out to listeners. Sink
    /// failures land in the report; the merge goes on.
    fn dispatch(
        &mut self,
        layer: LayerId,
        feature: &Feature,
        sink: &mut dyn RenderSink,
        report: &mut RenderReport,
    ) {
        let layers = self.layers;
        let descriptor = &layers[layer.0];
        match sink.paint(descriptor, feature) {
            Ok(()) => {
                report.painted += 1;
                for listener in &mut self.listeners {
                    listener.feature_rendered(&descriptor.name, feature);
                }
            }
            Err(error) => {
                let failure = PaintFailure {
                    layer: descriptor.name.clone(),
                    feature: feature.id.clone(),
                    error,
                };
                for listener in &mut self.listeners {
                    listener.error_occurred(&failure);
                }
                report.failures.push(failure);
            }
        }
    }
}

/// One stream of a merge group plus its buffered head.
struct Cursor {
    stream: OrderedFeatureStream,
    head: Option<(Feature, Vec<AttrValue>)>,
    done: bool,
}

/// Whether `a`'s head sorts strictly before `b`'s under `sort`.
fn head_less_than(sort: &SortKey, a: &Cursor, b: &Cursor) -> Result<bool, ComposeError> {
    let (Some((fa, va)), Some((fb, vb))) = (a.head.as_ref(), b.head.as_ref()) else {
        return Ok(false);
    };
    match sort.compare_values(va, vb) {
        Some(ordering) => Ok(ordering == Ordering::Less),
        None => Err(incomparable_heads(sort, a.stream.layer_name(), fa, va, fb, vb)),
    }
}

/// Build the attribute-resolution error for a cross-type head comparison.
///
/// `compare_values` bails at the first incomparable entry, with all
/// earlier entries equal, so the first pair without a natural ordering is
/// exactly the entry that failed.
fn incomparable_heads(
    sort: &SortKey,
    layer: &str,
    fa: &Feature,
    va: &[AttrValue],
    fb: &Feature,
    vb: &[AttrValue],
) -> ComposeError {
    let offending = sort
        .entries
        .iter()
        .zip(va.iter().zip(vb))
        .find(|(_, (x, y))| x.compare(y).is_none());
    let (attribute, reason) = offending.map_or_else(
        || {
            (
                String::from("<unknown>"),
                String::from("sort values cannot be ordered"),
            )
        },
        |(entry, (x, y))| {
            (
                entry.attribute.clone(),
                format!(
                    "{} value cannot be ordered against {} value on feature '{}'",
                    x.type_name(),
                    y.type_name(),
                    fb.id
                ),
            )
        },
    );
    ComposeError::AttributeResolution {
        layer: layer.to_string(),
        attribute,
        feature: fa.id.clone(),
        reason,
    }
}
