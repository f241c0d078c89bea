//! The pixel canvas and the [`RenderSink`] that paints onto it.
//!
//! Geometry coordinates are already in screen space, so painting is a
//! direct translation of each symbolizer into `tiny-skia` path drawing.
//! When a layer's symbolizer family does not match a feature's geometry
//! the sink picks the closest sensible interpretation instead of failing:
//! a line styled with a fill strokes its path with the fill color, a
//! point styled with anything paints a default-sized marker.

use std::path::Path as FsPath;

use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use inkmap_compose::{LayerDescriptor, RenderSink, SinkError};
use inkmap_feature::{Feature, Geometry, ScreenPos};
use inkmap_style::{ColorValue, Symbolizer};

use crate::RasterError;

/// An RGBA pixel canvas backed by a `tiny-skia` pixmap.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// A canvas of the given size, filled with `background`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::InvalidDimensions`] if either dimension is
    /// zero.
    pub fn new(width: u32, height: u32, background: ColorValue) -> Result<Self, RasterError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterError::InvalidDimensions { width, height })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));
        Ok(Self { pixmap })
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The straight-alpha color of one pixel, or `None` outside the
    /// canvas. Intended for pixel-probe assertions in tests.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<ColorValue> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let index = (y * self.width() + x) as usize;
        let color = self.pixmap.pixels()[index].demultiply();
        Some(ColorValue {
            r: color.red(),
            g: color.green(),
            b: color.blue(),
            a: color.alpha(),
        })
    }

    /// Copy the canvas out as a straight-alpha [`RgbaImage`].
    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        let mut data = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for premultiplied in self.pixmap.pixels() {
            let color = premultiplied.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| RgbaImage::from_pixel(self.width(), self.height(), Rgba([0; 4])))
    }

    /// Write the canvas to `path` as a PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Save`] if encoding or writing fails.
    pub fn save_png(&self, path: &FsPath) -> Result<(), RasterError> {
        self.to_image().save(path).map_err(|e| RasterError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Paints features onto a [`Canvas`] in the order the compositor
/// dispatches them.
pub struct CanvasSink {
    canvas: Canvas,
}

impl CanvasSink {
    /// A sink painting onto `canvas`.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    /// Borrow the canvas, e.g. to probe pixels mid-render.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Take the finished canvas back out of the sink.
    #[must_use]
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    fn fill_polygon(
        &mut self,
        outer: &[ScreenPos],
        holes: &[Vec<ScreenPos>],
        fill: ColorValue,
        outline: Option<(ColorValue, f32)>,
        feature_id: &str,
    ) -> Result<(), SinkError> {
        let mut builder = PathBuilder::new();
        push_ring(&mut builder, outer, feature_id)?;
        for hole in holes {
            push_ring(&mut builder, hole, feature_id)?;
        }
        let path = finish_path(builder, feature_id)?;
        // Even-odd so that hole rings punch through the outer ring
        // regardless of their winding direction.
        self.canvas.pixmap.fill_path(
            &path,
            &color_paint(fill),
            FillRule::EvenOdd,
            Transform::identity(),
            None,
        );
        if let Some((color, width)) = outline {
            self.stroke(&path, color, width);
        }
        Ok(())
    }

    fn stroke_line(
        &mut self,
        points: &[ScreenPos],
        color: ColorValue,
        width: f32,
        feature_id: &str,
    ) -> Result<(), SinkError> {
        if points.len() < 2 {
            return Err(SinkError::new(format!(
                "feature '{feature_id}' has a line with {} point(s); at least 2 are required",
                points.len()
            )));
        }
        let mut builder = PathBuilder::new();
        move_line(&mut builder, points, feature_id)?;
        let path = finish_path(builder, feature_id)?;
        self.stroke(&path, color, width);
        Ok(())
    }

    fn fill_marker(
        &mut self,
        center: ScreenPos,
        color: ColorValue,
        diameter: f32,
        feature_id: &str,
    ) -> Result<(), SinkError> {
        let mut builder = PathBuilder::new();
        builder.push_circle(center.x, center.y, diameter / 2.0);
        let path = finish_path(builder, feature_id)?;
        self.canvas.pixmap.fill_path(
            &path,
            &color_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn stroke(&mut self, path: &Path, color: ColorValue, width: f32) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.canvas.pixmap.stroke_path(
            path,
            &color_paint(color),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

impl RenderSink for CanvasSink {
    fn paint(&mut self, layer: &LayerDescriptor, feature: &Feature) -> Result<(), SinkError> {
        // A layer without a symbolizer participates in ordering but
        // paints nothing.
        let Some(symbolizer) = &layer.style.symbolizer else {
            return Ok(());
        };
        match &feature.geometry {
            Geometry::Polygon { outer, holes } => {
                let (fill, outline) = match symbolizer {
                    Symbolizer::Fill(f) => (
                        f.fill,
                        f.stroke.as_ref().map(|s| (s.color, s.width)),
                    ),
                    Symbolizer::Line(s) => (s.color, Some((s.color, s.width))),
                    Symbolizer::Marker(m) => (m.color, None),
                };
                self.fill_polygon(outer, holes, fill, outline, &feature.id)
            }
            Geometry::LineString(points) => {
                let (color, width) = match symbolizer {
                    Symbolizer::Line(s) => (s.color, s.width),
                    Symbolizer::Fill(f) => f
                        .stroke
                        .as_ref()
                        .map_or((f.fill, 1.0), |s| (s.color, s.width)),
                    Symbolizer::Marker(m) => (m.color, 1.0),
                };
                self.stroke_line(points, color, width, &feature.id)
            }
            Geometry::Point(center) => {
                let (color, diameter) = match symbolizer {
                    Symbolizer::Marker(m) => (m.color, m.size),
                    Symbolizer::Fill(f) => (f.fill, 6.0),
                    Symbolizer::Line(s) => (s.color, 6.0),
                };
                self.fill_marker(*center, color, diameter, &feature.id)
            }
        }
    }
}

/// An opaque anti-aliased paint in the given color.
fn color_paint(color: ColorValue) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Append a closed ring to `builder`.
fn push_ring(
    builder: &mut PathBuilder,
    ring: &[ScreenPos],
    feature_id: &str,
) -> Result<(), SinkError> {
    if ring.len() < 3 {
        return Err(SinkError::new(format!(
            "feature '{feature_id}' has a ring with {} point(s); at least 3 are required",
            ring.len()
        )));
    }
    move_line(builder, ring, feature_id)?;
    builder.close();
    Ok(())
}

/// Append an open polyline to `builder`.
fn move_line(
    builder: &mut PathBuilder,
    points: &[ScreenPos],
    feature_id: &str,
) -> Result<(), SinkError> {
    for point in points {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(SinkError::new(format!(
                "feature '{feature_id}' has a non-finite coordinate ({}, {})",
                point.x, point.y
            )));
        }
    }
    let Some((first, rest)) = points.split_first() else {
        return Err(SinkError::new(format!(
            "feature '{feature_id}' has an empty coordinate list"
        )));
    };
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    Ok(())
}

/// Finish a path, rejecting geometry `tiny-skia` considers degenerate.
fn finish_path(builder: PathBuilder, feature_id: &str) -> Result<Path, SinkError> {
    builder.finish().ok_or_else(|| {
        SinkError::new(format!("feature '{feature_id}' produced a degenerate path"))
    })
}
