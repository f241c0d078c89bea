//! Thresholded image comparison for pixel-level acceptance tests.
//!
//! Anti-aliasing makes edge pixels sensitive to rasterizer minutiae, so
//! exact equality is the wrong contract for rendered output. A pixel
//! counts as matching when every channel is within a small tolerance;
//! an image counts as matching when at most a bounded number of pixels
//! mismatch.

use image::RgbaImage;

use crate::RasterError;

/// Number of pixels whose color differs by more than `channel_tolerance`
/// in any RGBA channel.
///
/// # Errors
///
/// Returns [`RasterError::DimensionMismatch`] if the images are not the
/// same size; differently-sized outputs are never "close enough".
pub fn diff_count(
    expected: &RgbaImage,
    actual: &RgbaImage,
    channel_tolerance: u8,
) -> Result<usize, RasterError> {
    if expected.dimensions() != actual.dimensions() {
        return Err(RasterError::DimensionMismatch {
            expected_width: expected.width(),
            expected_height: expected.height(),
            actual_width: actual.width(),
            actual_height: actual.height(),
        });
    }
    let mismatched = expected
        .pixels()
        .zip(actual.pixels())
        .filter(|(a, b)| {
            a.0.iter()
                .zip(b.0.iter())
                .any(|(&x, &y)| x.abs_diff(y) > channel_tolerance)
        })
        .count();
    Ok(mismatched)
}

/// Whether `actual` matches `expected` within the given tolerances.
///
/// # Errors
///
/// Returns [`RasterError::DimensionMismatch`] if the images are not the
/// same size.
pub fn images_match(
    expected: &RgbaImage,
    actual: &RgbaImage,
    channel_tolerance: u8,
    max_mismatched_pixels: usize,
) -> Result<bool, RasterError> {
    Ok(diff_count(expected, actual, channel_tolerance)? <= max_mismatched_pixels)
}
