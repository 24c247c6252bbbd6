//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP, TIFF) and produces a
//! [`RasterImage`], and converts RGB buffers to the single channel the
//! rest of the pipeline works on.

use image::{GrayImage, RgbImage};

use crate::types::{PipelineError, RasterImage};

/// Decode raw image bytes into an RGB [`RasterImage`].
///
/// Alpha, if present, is dropped.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(RasterImage::from_dynamic(&img))
}

/// Convert an RGB buffer to grayscale.
///
/// Uses the `image` crate's luminance weights, so green contributes
/// most and blue least.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    image::imageops::grayscale(rgb)
}
