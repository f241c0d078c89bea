//! Feature and geometry model for the inkmap renderer.
//!
//! This crate provides the plain value types every other inkmap component
//! consumes: attribute values with a natural ordering, screen-space
//! geometries, and the [`Feature`] that ties them together.
//!
//! # Design
//!
//! Features carry *final screen geometry*: reprojection, clipping and
//! generalization all happen upstream of the renderer. Geometry here is
//! modeled after the three simple-feature families the renderer paints
//! (see [OGC Simple Feature Access §6.1](https://www.ogc.org/standard/sfa/)):
//! points, line strings, and polygons with optional holes.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Map of attribute names to values for a feature.
pub type AttributesMap = HashMap<String, AttrValue>;

/// A single feature attribute value.
///
/// Only the value families the sort comparator understands are modeled:
/// numeric (integer and floating point), string, and temporal. Temporal
/// values are stored as milliseconds since the Unix epoch, which is also
/// their natural ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float. Ordered via `f64::total_cmp`, so NaN is ordered too
    /// rather than poisoning the comparison.
    Float(f64),
    /// UTF-8 string, ordered lexicographically by code point.
    Str(String),
    /// Timestamp in milliseconds since the Unix epoch.
    Time(i64),
}

impl AttrValue {
    /// Compare two values under the natural ordering of their type family.
    ///
    /// `Int` and `Float` belong to the same numeric family and compare
    /// against each other by promoting the integer to `f64`. Any other
    /// cross-family pair has no natural ordering and returns `None`; the
    /// sort comparator treats that as an attribute resolution failure
    /// rather than guessing an order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) | (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => Some((*a as f64).total_cmp(b)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => Some(a.total_cmp(&(*b as f64))),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Short name of the value's type family, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Time(_) => "timestamp",
        }
    }
}

/// A position in final screen coordinates (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
}

impl ScreenPos {
    /// Create a position from pixel coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x covered by the geometry.
    pub min_x: f32,
    /// Smallest y covered by the geometry.
    pub min_y: f32,
    /// Largest x covered by the geometry.
    pub max_x: f32,
    /// Largest y covered by the geometry.
    pub max_y: f32,
}

impl BoundingBox {
    /// Grow the box to also cover `pos`.
    fn expand(&mut self, pos: ScreenPos) {
        self.min_x = self.min_x.min(pos.x);
        self.min_y = self.min_y.min(pos.y);
        self.max_x = self.max_x.max(pos.x);
        self.max_y = self.max_y.max(pos.y);
    }

    /// Merge two boxes into the smallest box covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Feature geometry in final screen coordinates.
///
/// The three families mirror [OGC Simple Feature Access
/// §6.1.2](https://www.ogc.org/standard/sfa/): Point, LineString and
/// Polygon. Multi-geometries are flattened into separate features upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position, painted as a marker.
    Point(ScreenPos),
    /// An open polyline with at least two vertices.
    LineString(Vec<ScreenPos>),
    /// A filled ring with optional interior holes.
    ///
    /// "The exterior boundary LinearRing defines the 'top' of the surface...
    /// Interior LinearRings define holes in the surface." (SFA §6.1.11)
    Polygon {
        /// Exterior ring. Closure is implicit; the first vertex is not
        /// required to be repeated at the end.
        outer: Vec<ScreenPos>,
        /// Interior rings subtracted from the fill.
        holes: Vec<Vec<ScreenPos>>,
    },
}

impl Geometry {
    /// Bounding box of the geometry, or `None` for an empty geometry
    /// (a line or ring with no vertices).
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let seed = |pos: ScreenPos| BoundingBox {
            min_x: pos.x,
            min_y: pos.y,
            max_x: pos.x,
            max_y: pos.y,
        };
        match self {
            Self::Point(pos) => Some(seed(*pos)),
            Self::LineString(points) => {
                let mut bbox = seed(*points.first()?);
                for pos in &points[1..] {
                    bbox.expand(*pos);
                }
                Some(bbox)
            }
            Self::Polygon { outer, .. } => {
                // Holes lie inside the outer ring and cannot extend the box.
                let mut bbox = seed(*outer.first()?);
                for pos in &outer[1..] {
                    bbox.expand(*pos);
                }
                Some(bbox)
            }
        }
    }
}

/// A renderable feature: identity, screen geometry, and named attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Source-assigned identifier, carried through to error reports.
    pub id: String,
    /// Geometry in final screen coordinates.
    pub geometry: Geometry,
    /// Named attribute values used for sorting and styling.
    pub attrs: AttributesMap,
}

impl Feature {
    /// Create a feature from its parts.
    #[must_use]
    pub const fn new(id: String, geometry: Geometry, attrs: AttributesMap) -> Self {
        Self {
            id,
            geometry,
            attrs,
        }
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}
