//! Line-oriented property file feature source.
//!
//! A small plain-text feature format used for fixtures and demos, in the
//! spirit of classic property-file datastores: one typed header line, then
//! one feature per line.
//!
//! ```text
//! # squares with a z-order attribute
//! _=cat:Integer,z:Integer,geom:Polygon
//! f1=1|10|POLYGON ((0 0, 40 0, 40 40, 0 40))
//! f2=2|5|POLYGON ((20 20, 60 20, 60 60, 20 60))
//! ```
//!
//! The header (`_=`) declares the columns: attribute columns with a value
//! type, and exactly one geometry column typed `Point`, `LineString` or
//! `Polygon`. Feature lines are `id=value|value|geometry`; an empty value
//! leaves that attribute absent on the feature. Geometry text is the
//! matching WKT form with screen-pixel coordinates.
//!
//! Everything is parsed eagerly at construction; sort pushdown then
//! delegates to the in-memory machinery of [`MemorySource`]. Sorting thus
//! happens inside the store, never in the compositor.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use inkmap_feature::{AttrValue, AttributesMap, Feature, Geometry, ScreenPos};
use inkmap_style::SortKey;

use crate::memory::MemorySource;
use crate::{FeatureSource, FeatureStream, SourceError};

/// Column value type declared in a property file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PropertyType {
    /// 64-bit signed integer attribute.
    Integer,
    /// 64-bit float attribute.
    Double,
    /// String attribute.
    String,
    /// Timestamp attribute (milliseconds since the Unix epoch).
    Timestamp,
    /// Point geometry column.
    Point,
    /// Line string geometry column.
    LineString,
    /// Polygon geometry column.
    Polygon,
}

impl PropertyType {
    /// Whether the column holds the feature geometry.
    #[must_use]
    pub const fn is_geometry(self) -> bool {
        matches!(self, Self::Point | Self::LineString | Self::Polygon)
    }
}

/// One declared column of a property file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared value type.
    pub kind: PropertyType,
}

/// The declared columns of a property file, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// All columns, attribute and geometry alike.
    pub columns: Vec<Column>,
}

impl Schema {
    /// The geometry column's declared type.
    #[must_use]
    pub fn geometry_type(&self) -> Option<PropertyType> {
        self.columns
            .iter()
            .map(|c| c.kind)
            .find(|k| k.is_geometry())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", column.name, column.kind)?;
        }
        Ok(())
    }
}

/// Feature source backed by a parsed property file.
#[derive(Debug, Clone)]
pub struct PropertySource {
    schema: Schema,
    inner: MemorySource,
}

impl PropertySource {
    /// Parse a property file from disk. The source is named after the
    /// file stem, like a table named after its file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read, or
    /// [`SourceError::Parse`] with line context if it is malformed.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: display.clone(),
            message: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| display.clone(), |s| s.to_string_lossy().into_owned());
        Self::from_text(&name, &display, &text)
    }

    /// Parse property file text. `origin` labels parse errors (a path for
    /// files, any tag for inline fixtures).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Parse`] with line context if the text is
    /// malformed or no header line is present.
    pub fn from_text(name: &str, origin: &str, text: &str) -> Result<Self, SourceError> {
        let parse_err = |line: usize, message: String| SourceError::Parse {
            path: origin.to_string(),
            line,
            message,
        };

        let mut schema: Option<Schema> = None;
        let mut features = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (id, body) = line
                .split_once('=')
                .ok_or_else(|| parse_err(line_no, "expected 'id=values'".to_string()))?;
            if id == "_" {
                schema = Some(parse_schema(body).map_err(|m| parse_err(line_no, m))?);
                continue;
            }
            let Some(schema) = schema.as_ref() else {
                return Err(parse_err(
                    line_no,
                    "feature line before the '_=' header".to_string(),
                ));
            };
            features.push(parse_feature(id, body, schema).map_err(|m| parse_err(line_no, m))?);
        }

        let schema =
            schema.ok_or_else(|| parse_err(1, "missing '_=' header line".to_string()))?;
        Ok(Self {
            schema,
            inner: MemorySource::new(name, features),
        })
    }

    /// The declared columns of the file.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl FeatureSource for PropertySource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&self, sort: Option<&SortKey>) -> Result<Box<dyn FeatureStream>, SourceError> {
        self.inner.open(sort)
    }
}

fn parse_schema(body: &str) -> Result<Schema, String> {
    let mut columns = Vec::new();
    let mut geometry_columns = 0;
    for decl in body.split(',') {
        let decl = decl.trim();
        let (name, kind) = decl
            .split_once(':')
            .ok_or_else(|| format!("expected 'name:Type' in column '{decl}'"))?;
        let kind = PropertyType::from_str(kind.trim())
            .map_err(|_| format!("unknown column type '{}'", kind.trim()))?;
        if kind.is_geometry() {
            geometry_columns += 1;
        }
        columns.push(Column {
            name: name.trim().to_string(),
            kind,
        });
    }
    if geometry_columns != 1 {
        return Err(format!(
            "expected exactly one geometry column, found {geometry_columns}"
        ));
    }
    Ok(Schema { columns })
}

fn parse_feature(id: &str, body: &str, schema: &Schema) -> Result<Feature, String> {
    let values: Vec<&str> = body.split('|').collect();
    if values.len() != schema.columns.len() {
        return Err(format!(
            "expected {} values, found {}",
            schema.columns.len(),
            values.len()
        ));
    }

    let mut attrs = AttributesMap::new();
    let mut geometry = None;
    for (column, raw) in schema.columns.iter().zip(values) {
        let raw = raw.trim();
        if column.kind.is_geometry() {
            geometry = Some(parse_geometry(column.kind, raw)?);
            continue;
        }
        // Empty value = absent attribute (null).
        if raw.is_empty() {
            continue;
        }
        let value = parse_value(column.kind, raw)
            .map_err(|m| format!("column '{}': {m}", column.name))?;
        let _ = attrs.insert(column.name.clone(), value);
    }

    // parse_schema guarantees one geometry column.
    let geometry = geometry.ok_or_else(|| "missing geometry value".to_string())?;
    Ok(Feature::new(id.to_string(), geometry, attrs))
}

fn parse_value(kind: PropertyType, raw: &str) -> Result<AttrValue, String> {
    match kind {
        PropertyType::Integer => raw
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| format!("invalid integer '{raw}'")),
        PropertyType::Double => raw
            .parse::<f64>()
            .map(AttrValue::Float)
            .map_err(|_| format!("invalid double '{raw}'")),
        PropertyType::Timestamp => raw
            .parse::<i64>()
            .map(AttrValue::Time)
            .map_err(|_| format!("invalid timestamp '{raw}'")),
        PropertyType::String => Ok(AttrValue::Str(raw.to_string())),
        PropertyType::Point | PropertyType::LineString | PropertyType::Polygon => {
            unreachable!("geometry columns are handled by parse_geometry")
        }
    }
}

fn parse_geometry(kind: PropertyType, raw: &str) -> Result<Geometry, String> {
    match kind {
        PropertyType::Point => {
            let inner = strip_keyword(raw, "POINT")?;
            let coords = parse_coords(strip_parens(inner)?)?;
            match coords.as_slice() {
                [pos] => Ok(Geometry::Point(*pos)),
                _ => Err(format!("POINT needs exactly one coordinate: '{raw}'")),
            }
        }
        PropertyType::LineString => {
            let inner = strip_keyword(raw, "LINESTRING")?;
            let coords = parse_coords(strip_parens(inner)?)?;
            if coords.len() < 2 {
                return Err(format!("LINESTRING needs at least two coordinates: '{raw}'"));
            }
            Ok(Geometry::LineString(coords))
        }
        PropertyType::Polygon => {
            let inner = strip_keyword(raw, "POLYGON")?;
            let mut rings = parse_rings(strip_parens(inner)?)?;
            if rings.is_empty() {
                return Err(format!("POLYGON needs at least an outer ring: '{raw}'"));
            }
            let outer = rings.remove(0);
            if outer.len() < 3 {
                return Err(format!("polygon ring needs at least three vertices: '{raw}'"));
            }
            Ok(Geometry::Polygon {
                outer,
                holes: rings,
            })
        }
        _ => unreachable!("attribute columns are handled by parse_value"),
    }
}

fn strip_keyword<'a>(raw: &'a str, keyword: &str) -> Result<&'a str, String> {
    raw.strip_prefix(keyword)
        .map(str::trim_start)
        .ok_or_else(|| format!("expected '{keyword} (...)', found '{raw}'"))
}

fn strip_parens(raw: &str) -> Result<&str, String> {
    raw.strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| format!("expected parenthesized coordinates, found '{raw}'"))
}

/// Parse `"x y, x y, ..."` into screen positions.
fn parse_coords(text: &str) -> Result<Vec<ScreenPos>, String> {
    let mut coords = Vec::new();
    for pair in text.split(',') {
        let pair = pair.trim();
        let (x, y) = pair
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("expected 'x y', found '{pair}'"))?;
        let x: f32 = x
            .trim()
            .parse()
            .map_err(|_| format!("invalid coordinate '{pair}'"))?;
        let y: f32 = y
            .trim()
            .parse()
            .map_err(|_| format!("invalid coordinate '{pair}'"))?;
        coords.push(ScreenPos::new(x, y));
    }
    Ok(coords)
}

/// Parse `"(x y, ...), (x y, ...)"` into rings, outer ring first.
fn parse_rings(text: &str) -> Result<Vec<Vec<ScreenPos>>, String> {
    let mut rings = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let open = rest
            .find('(')
            .ok_or_else(|| format!("expected '(' before ring, found '{rest}'"))?;
        let close = rest[open..]
            .find(')')
            .map(|i| i + open)
            .ok_or_else(|| format!("unclosed ring in '{rest}'"))?;
        rings.push(parse_coords(&rest[open + 1..close])?);
        rest = rest[close + 1..].trim_start().trim_start_matches(',').trim_start();
    }
    Ok(rings)
}
