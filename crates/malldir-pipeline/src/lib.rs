//! malldir-pipeline: Pure storefront tracing pipeline (sans-IO).
//!
//! Converts a scanned mall directory into closed polygons through:
//! downscale -> binarize or blur -> Canny edge detection -> outer
//! boundary tracing -> closed Douglas-Peucker simplification -> area
//! filter -> rescale -> optional rectilinear snapping.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns structured data. File, clipboard and threading
//! concerns live in `malldir-io`.

pub mod binarize;
pub mod blur;
mod canny;
pub mod contour;
pub mod downsample;
pub mod edge;
pub mod grayscale;
pub mod measure;
pub mod polygon;
pub mod preprocess;
pub mod rectilinear;
pub mod simplify;
pub mod stage;
pub mod types;
pub mod vectorize;

pub use measure::Calibration;
pub use stage::Stage;
pub use types::{
    Contour, ContourId, Dimensions, GrayImage, PipelineError, PipelineParameters, Point,
    Polyline, RasterImage, RectilinearSnap, RgbImage, TraceOutput,
};

/// Run the full tracing pipeline on `image`.
///
/// Equivalent to [`trace_with_progress`] with a no-op callback.
///
/// # Errors
///
/// See [`trace_with_progress`].
pub fn trace(image: &RasterImage, params: &PipelineParameters) -> Result<TraceOutput, PipelineError> {
    trace_with_progress(image, params, |_| {})
}

/// Run the full tracing pipeline, reporting each [`Stage`] as it starts.
///
/// # Pipeline steps
///
/// 1. Downscale so the longest side is at most `max_dimension`
/// 2. Binarize (Otsu, invert, opening) or grayscale + 3x3 blur
/// 3. Canny edge detection with clamped thresholds
/// 4. Outer boundary tracing with chain compression
/// 5. Simplify, filter by area and vertex count, rescale, snap
///
/// An image with no qualifying boundaries yields an empty contour set,
/// not an error.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `params` fails
/// [`PipelineParameters::validate`].
/// Returns [`PipelineError::EmptyImage`] if the image has zero width or
/// height.
pub fn trace_with_progress(
    image: &RasterImage,
    params: &PipelineParameters,
    mut progress: impl FnMut(Stage),
) -> Result<TraceOutput, PipelineError> {
    params.validate()?;
    let dimensions = image.dimensions();
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(PipelineError::EmptyImage(dimensions));
    }

    let prepared = preprocess::preprocess(image, params, &mut progress);

    progress(Stage::DetectEdges);
    let edges = edge::canny(&prepared.buffer, params.canny_low, params.canny_high);

    progress(Stage::FindContours);
    let boundaries = contour::trace_outer_boundaries(&edges);

    progress(Stage::ProcessContours);
    let contours = vectorize::vectorize(&boundaries, params, prepared.scale);

    Ok(TraceOutput {
        contours,
        dimensions,
        working: prepared.working,
        scale: prepared.scale,
    })
}
