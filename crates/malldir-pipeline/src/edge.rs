//! Canny threshold handling.
//!
//! Wraps [`crate::canny::canny`] with the threshold handling operators
//! rely on: the two thresholds are set independently, so the low one can
//! end up above the high one (the pair is swapped), or at zero (raised
//! to [`MIN_THRESHOLD`]).

use image::GrayImage;

/// Minimum allowed Canny threshold.
///
/// A zero threshold marks every pixel with any gradient as an edge,
/// which fuses all storefronts into one contour.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Order a threshold pair and raise both to at least [`MIN_THRESHOLD`].
///
/// A reversed pair is swapped rather than collapsed.
#[must_use]
pub fn clamp_thresholds(low: f32, high: f32) -> (f32, f32) {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    (low.max(MIN_THRESHOLD), high.max(MIN_THRESHOLD))
}

/// Detect edges using the Canny algorithm with clamped thresholds.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: u8, high_threshold: u8) -> GrayImage {
    let (low, high) = clamp_thresholds(f32::from(low_threshold), f32::from(high_threshold));
    crate::canny::canny(image, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn clamp_raises_zero_thresholds() {
        assert_eq!(clamp_thresholds(0.0, 0.0), (MIN_THRESHOLD, MIN_THRESHOLD));
    }

    #[test]
    fn clamp_swaps_reversed_pair() {
        assert_eq!(clamp_thresholds(200.0, 100.0), (100.0, 200.0));
        assert_eq!(clamp_thresholds(50.0, 0.0), (MIN_THRESHOLD, 50.0));
    }

    #[test]
    fn clamp_keeps_ordered_pair() {
        assert_eq!(clamp_thresholds(70.0, 140.0), (70.0, 140.0));
    }

    #[test]
    fn zero_low_threshold_matches_min() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 0, 150), canny(&img, 1, 150));
    }

    #[test]
    fn reversed_thresholds_match_ordered_pair() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 200, 50), canny(&img, 50, 200));
    }

    /// A 0 -> 30 step has an L1 Sobel magnitude of 120: below a high
    /// threshold of 200, so ordered or reversed it yields no edges.
    #[test]
    fn reversed_thresholds_do_not_loosen_detection() {
        let img = GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([30])
            }
        });
        let ordered = canny(&img, 50, 200);
        assert!(ordered.pixels().all(|p| p.0[0] == 0));
        assert_eq!(canny(&img, 200, 50), ordered);
    }
}
