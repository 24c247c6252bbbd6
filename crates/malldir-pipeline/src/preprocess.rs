//! Preparing a source image for edge detection.
//!
//! Two branches, chosen by [`PipelineParameters::binarize`]:
//!
//! - **Binarize** (line art): grayscale, Otsu threshold, optional
//!   inversion, optional morphological opening.
//! - **Smooth** (photos, low-contrast scans): grayscale, 3x3 Gaussian blur.
//!
//! Both run on the downscaled buffer.

use image::GrayImage;

use crate::binarize;
use crate::blur;
use crate::downsample;
use crate::grayscale;
use crate::stage::Stage;
use crate::types::{Dimensions, PipelineParameters, RasterImage};

/// Output of [`preprocess`]: the single-channel buffer handed to the
/// edge detector, and the scale that produced it.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Binary mask or blurred grayscale, at working resolution.
    pub buffer: GrayImage,
    /// Downscale factor (`<= 1.0`) from source to working resolution.
    pub scale: f64,
    /// Working resolution.
    pub working: Dimensions,
}

/// Downscale and condition `image` according to `params`.
///
/// `progress` is called with each [`Stage`] before it runs.
#[must_use]
pub fn preprocess(
    image: &RasterImage,
    params: &PipelineParameters,
    progress: &mut impl FnMut(Stage),
) -> Preprocessed {
    progress(Stage::Downscale);
    let (resized, scale) = downsample::downsample(image.pixels(), params.max_dimension);
    let working = Dimensions {
        width: resized.width(),
        height: resized.height(),
    };

    let buffer = if params.binarize {
        progress(Stage::Binarize);
        let gray = grayscale::to_grayscale(&resized);
        let (mask, _level) = binarize::otsu_binarize(&gray);
        let mask = if params.invert_binary {
            binarize::invert(&mask)
        } else {
            mask
        };
        binarize::open(&mask, params.morph_kernel_size)
    } else {
        progress(Stage::Grayscale);
        blur::gaussian_blur_3x3(&grayscale::to_grayscale(&resized))
    };

    Preprocessed {
        buffer,
        scale,
        working,
    }
}
