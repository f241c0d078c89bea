//! Software rasterizer for composited map features.
//!
//! The compositor decides *when* each feature paints; this crate decides
//! *how*. [`Canvas`] wraps a `tiny-skia` pixmap, [`CanvasSink`] implements
//! the compositor's sink trait by executing each feature's symbolizer as
//! anti-aliased path drawing, and [`compare`] provides the thresholded
//! image diff used by pixel-level acceptance tests.

use std::path::PathBuf;

use thiserror::Error;

pub mod canvas;
pub mod compare;

pub use canvas::{Canvas, CanvasSink};

/// Fatal rasterizer errors: canvas creation and image I/O.
///
/// Per-feature paint problems are *not* here; they surface as recoverable
/// sink errors so one bad feature cannot take down a whole render.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The requested canvas dimensions cannot back a pixel buffer.
    #[error("cannot create a {width}x{height} canvas; both dimensions must be non-zero")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Writing the rendered image to disk failed.
    #[error("failed to save image to '{}': {message}", path.display())]
    Save {
        /// Destination path.
        path: PathBuf,
        /// What the image encoder reported.
        message: String,
    },

    /// Two images were compared but do not have the same dimensions.
    #[error("image dimensions differ: {expected_width}x{expected_height} vs {actual_width}x{actual_height}")]
    DimensionMismatch {
        /// Width of the expected image.
        expected_width: u32,
        /// Height of the expected image.
        expected_height: u32,
        /// Width of the actual image.
        actual_width: u32,
        /// Height of the actual image.
        actual_height: u32,
    },
}
