//! Shared types for the contour tracing pipeline.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage`, the pixel buffer behind [`RasterImage`].
pub use image::RgbImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Divide both coordinates by `factor`.
    #[must_use]
    pub fn unscale(self, factor: f64) -> Self {
        Self::new(self.x / factor, self.y / factor)
    }
}

/// An ordered sequence of points.
///
/// Boundaries coming out of the contour extractor are closed
/// implicitly: the last point connects back to the first and is not
/// repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Mutable access to the points, for in-place vertex edits.
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An immutable, cheaply cloneable 8-bit RGB image.
///
/// Cloning shares the pixel buffer, so a snapshot can be handed to a
/// background worker without copying. A new image replaces the old one;
/// the pixels are never mutated in place.
#[derive(Debug, Clone)]
pub struct RasterImage(Arc<RgbImage>);

impl RasterImage {
    /// Wrap an owned RGB buffer.
    #[must_use]
    pub fn new(pixels: RgbImage) -> Self {
        Self(Arc::new(pixels))
    }

    /// Convert any decoded image to 8-bit RGB, dropping alpha.
    #[must_use]
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        Self::new(image.to_rgb8())
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Width and height as [`Dimensions`].
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Borrow the underlying pixel buffer.
    #[must_use]
    pub fn pixels(&self) -> &RgbImage {
        &self.0
    }
}

/// Post-trace right-angle snapping, used for rectilinear floor plans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectilinearSnap {
    /// Edges within this many degrees of horizontal or vertical are
    /// made exactly axis-aligned.
    pub angle_tolerance_deg: f64,
    /// Grid spacing in original-image pixels. `0.0` disables rounding.
    pub grid_snap: f64,
}

impl RectilinearSnap {
    /// Default angle tolerance in degrees.
    pub const DEFAULT_ANGLE_TOLERANCE_DEG: f64 = 12.0;
    /// Default grid spacing (disabled).
    pub const DEFAULT_GRID_SNAP: f64 = 0.0;
}

impl Default for RectilinearSnap {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: Self::DEFAULT_ANGLE_TOLERANCE_DEG,
            grid_snap: Self::DEFAULT_GRID_SNAP,
        }
    }
}

/// Parameters for one trace run.
///
/// A run reads a snapshot of these at start; later edits only affect
/// the next run.
///
/// # Canny threshold invariants
///
/// `canny_low` should not exceed `canny_high`. This is not rejected by
/// [`validate`](Self::validate): [`edge::canny`](crate::edge::canny)
/// swaps a reversed pair and raises both to
/// [`edge::MIN_THRESHOLD`](crate::edge::MIN_THRESHOLD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParameters {
    /// Canny hysteresis low threshold.
    pub canny_low: u8,

    /// Canny hysteresis high threshold.
    pub canny_high: u8,

    /// Simplification tolerance as a percentage (0-20) of each
    /// contour's perimeter.
    pub approx_epsilon_percent: f64,

    /// Minimum enclosed area for a contour to be kept, in working-buffer
    /// (downscaled) pixels.
    pub min_area: u32,

    /// Longest side of the image actually processed. Larger images are
    /// downscaled first.
    pub max_dimension: u32,

    /// Binarize with Otsu's threshold (line art) instead of blurring.
    pub binarize: bool,

    /// Invert the binarized mask. Ignored unless `binarize` is set.
    pub invert_binary: bool,

    /// Side of the square opening kernel. `0` disables the opening.
    pub morph_kernel_size: u8,

    /// Optional right-angle snapping applied after rescaling.
    pub rectilinear: Option<RectilinearSnap>,
}

impl PipelineParameters {
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: u8 = 70;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: u8 = 140;
    /// Default simplification tolerance (percent of perimeter).
    pub const DEFAULT_APPROX_EPSILON_PERCENT: f64 = 4.0;
    /// Default minimum contour area in pixels.
    pub const DEFAULT_MIN_AREA: u32 = 1200;
    /// Default processing resolution (longest side).
    pub const DEFAULT_MAX_DIMENSION: u32 = 1400;
    /// Default opening kernel side.
    pub const DEFAULT_MORPH_KERNEL_SIZE: u8 = 3;
    /// Upper bound of `approx_epsilon_percent`.
    pub const MAX_APPROX_EPSILON_PERCENT: f64 = 20.0;

    /// Check the ranges the pipeline cannot recover from.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `approx_epsilon_percent`
    /// is not a finite value in `0.0..=20.0`, if `max_dimension` is zero,
    /// or if the rectilinear settings are negative or non-finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=Self::MAX_APPROX_EPSILON_PERCENT).contains(&self.approx_epsilon_percent) {
            return Err(PipelineError::InvalidConfig(format!(
                "approx_epsilon_percent must be within 0-{}, got {}",
                Self::MAX_APPROX_EPSILON_PERCENT,
                self.approx_epsilon_percent,
            )));
        }
        if self.max_dimension == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        if let Some(snap) = self.rectilinear {
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(snap.angle_tolerance_deg) || !valid(snap.grid_snap) {
                return Err(PipelineError::InvalidConfig(format!(
                    "rectilinear settings must be finite and non-negative, got {snap:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            approx_epsilon_percent: Self::DEFAULT_APPROX_EPSILON_PERCENT,
            min_area: Self::DEFAULT_MIN_AREA,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            binarize: true,
            invert_binary: false,
            morph_kernel_size: Self::DEFAULT_MORPH_KERNEL_SIZE,
            rectilinear: None,
        }
    }
}

/// Identifier of a traced contour, stable within one run.
///
/// The number is the raw boundary's index in extraction order, so ids
/// of kept contours may have gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContourId(pub usize);

impl fmt::Display for ContourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contour_{}", self.0)
    }
}

/// An accepted polygon in original-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// Identifier within the run that produced it.
    pub id: ContourId,
    /// Polygon vertices (at least 3, closed implicitly).
    pub vertices: Polyline,
    /// Enclosed area in original-image square pixels.
    pub area: f64,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceOutput {
    /// Accepted contours, in extraction order.
    pub contours: Vec<Contour>,
    /// Dimensions of the source image.
    pub dimensions: Dimensions,
    /// Dimensions of the buffer actually processed.
    pub working: Dimensions,
    /// Downscale factor applied before processing (`<= 1.0`).
    pub scale: f64,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image has zero width or height.
    #[error("image has no pixels ({0})")]
    EmptyImage(Dimensions),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
