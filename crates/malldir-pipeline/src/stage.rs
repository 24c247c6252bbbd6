//! Progress reporting for a pipeline run.

use std::fmt;

/// A pipeline step, reported just before it starts.
///
/// The pure pipeline does not log; callers that want progress pass a
/// callback to [`trace_with_progress`](crate::trace_with_progress) and
/// render these however they like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Shrinking the image to the processing resolution.
    Downscale,
    /// Grayscale, Otsu threshold, inversion and opening.
    Binarize,
    /// Grayscale conversion and blur (non-binarized branch).
    Grayscale,
    /// Canny edge detection.
    DetectEdges,
    /// Outer-boundary tracing.
    FindContours,
    /// Simplification, filtering and rescaling.
    ProcessContours,
}

impl Stage {
    /// Operator-facing status line for this step.
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::Downscale => "Downscaling image...",
            Self::Binarize => "Binarizing image...",
            Self::Grayscale => "Converting to grayscale...",
            Self::DetectEdges => "Detecting edges...",
            Self::FindContours => "Finding contours...",
            Self::ProcessContours => "Processing contours...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}
