//! Canny edge detection over an already-preprocessed buffer.
//!
//! Derived from `imageproc::edges::{canny, non_maximum_suppression,
//! hysteresis}` with three changes:
//!
//! 1. **No internal blur.** The preprocessor has already binarized or
//!    smoothed the buffer; a second Gaussian pass would round off the
//!    corners of storefront outlines.
//! 2. **L1 gradient magnitude** (`|gx| + |gy|`), so the thresholds keep
//!    the scale operators are used to from tuning scanned directories.
//! 3. **Hysteresis visits all 8 neighbours with bounds checks.** Upstream
//!    skips north/north-east and underflows at `x = 0` / `y = 0`
//!    (<https://github.com/image-rs/imageproc/issues/705>).

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Edge pixel value in the output map.
const EDGE: u8 = 255;

/// Gradient direction bucket, in degrees folded to `[0, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal45,
    Vertical,
    Diagonal135,
}

impl Direction {
    fn from_gradient(gx: f32, gy: f32) -> Self {
        let mut angle = gy.atan2(gx).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if (22.5..67.5).contains(&angle) {
            Self::Diagonal45
        } else if (67.5..112.5).contains(&angle) {
            Self::Vertical
        } else if (112.5..157.5).contains(&angle) {
            Self::Diagonal135
        } else {
            Self::Horizontal
        }
    }

    /// Offsets of the two neighbours across the edge.
    const fn neighbours(self) -> [(i32, i32); 2] {
        match self {
            Self::Horizontal => [(-1, 0), (1, 0)],
            Self::Diagonal45 => [(1, 1), (-1, -1)],
            Self::Vertical => [(0, -1), (0, 1)],
            Self::Diagonal135 => [(-1, 1), (1, -1)],
        }
    }
}

/// Run Canny edge detection.
///
/// Returns a binary image: 255 for edge pixels, 0 elsewhere. Images
/// smaller than 3x3 have no interior and produce an empty map.
/// Callers are expected to pass `low_threshold <= high_threshold`
/// (see [`crate::edge::canny`]).
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return GrayImage::new(w, h);
    }

    // 1. Intensity of gradients.
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Image<Luma<f32>> = Image::from_fn(w, h, |x, y| {
        let dx = f32::from(gx.get_pixel(x, y).0[0]);
        let dy = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([dx.abs() + dy.abs()])
    });

    // 2. Non-maximum suppression (thin edges to one ridge).
    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);

    // 3. Hysteresis to keep weak edges connected to strong ones.
    hysteresis(&thinned, low_threshold, high_threshold)
}

/// Zero every pixel that is not a local maximum across its gradient.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (w, h) = g.dimensions();
    let mut out = Image::from_pixel(w, h, Luma([0.0]));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let direction = Direction::from_gradient(
                f32::from(gx.get_pixel(x, y).0[0]),
                f32::from(gy.get_pixel(x, y).0[0]),
            );
            let value = g.get_pixel(x, y).0[0];
            let is_max = direction.neighbours().iter().all(|&(dx, dy)| {
                let nx = (x as i32 + dx) as u32;
                let ny = (y as i32 + dy) as u32;
                value >= g.get_pixel(nx, ny).0[0]
            });
            if is_max {
                out.put_pixel(x, y, Luma([value]));
            }
        }
    }
    out
}

/// Double-threshold hysteresis as an iterative flood fill.
///
/// Pixels at or above `high` seed edges; pixels at or above `low` are
/// kept when 8-connected to a seed.
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if input.get_pixel(x, y).0[0] < high || out.get_pixel(x, y).0[0] == EDGE {
                continue;
            }
            out.put_pixel(x, y, Luma([EDGE]));
            stack.push((x, y));
            while let Some((nx, ny)) = stack.pop() {
                let neighbours = [
                    (nx + 1, ny),
                    (nx + 1, ny + 1),
                    (nx, ny + 1),
                    (nx.wrapping_sub(1), ny.wrapping_sub(1)),
                    (nx.wrapping_sub(1), ny),
                    (nx.wrapping_sub(1), ny + 1),
                    (nx, ny.wrapping_sub(1)),
                    (nx + 1, ny.wrapping_sub(1)),
                ];
                for (px, py) in neighbours {
                    if px >= w || py >= h {
                        continue;
                    }
                    if input.get_pixel(px, py).0[0] >= low && out.get_pixel(px, py).0[0] == 0 {
                        out.put_pixel(px, py, Luma([EDGE]));
                        stack.push((px, py));
                    }
                }
            }
        }
    }
    out
}
