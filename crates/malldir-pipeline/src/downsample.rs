//! Downscaling to the configured processing resolution.
//!
//! Images whose longest side exceeds `max_dimension` are shrunk with an
//! area-averaging filter: every destination pixel is the coverage-weighted
//! mean of the source pixels it overlaps. Shrinking scanned line art this
//! way keeps thin strokes from aliasing into dotted lines.
//!
//! The scale factor is returned alongside the image so traced
//! coordinates can be mapped back to the original.

use image::RgbImage;

/// Scale factor for an image of the given size: `min(1, max_dimension / long_side)`.
#[must_use]
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let long_side = width.max(height);
    if long_side == 0 {
        return 1.0;
    }
    (f64::from(max_dimension) / f64::from(long_side)).min(1.0)
}

/// Target size for `scale`: each side rounded, at least one pixel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let side = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (side(width), side(height))
}

/// Downscale `image` so its longest side is at most `max_dimension`.
///
/// Returns the (possibly unchanged) image and the scale factor applied.
/// A factor of `1.0` means the image was returned as-is.
#[must_use]
pub fn downsample(image: &RgbImage, max_dimension: u32) -> (RgbImage, f64) {
    let scale = scale_factor(image.width(), image.height(), max_dimension);
    if scale >= 1.0 {
        return (image.clone(), 1.0);
    }

    let (w, h) = scaled_size(image.width(), image.height(), scale);
    (area_resize(image, w, h), scale)
}

/// One destination sample: the source indices it covers and their weights.
type Taps = Vec<(u32, f64)>;

/// Per-axis coverage weights for shrinking `src_len` samples to `dst_len`.
///
/// Each destination sample covers `src_len / dst_len` source samples;
/// partially covered samples at either end get fractional weight. The
/// weights of each tap list sum to one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn area_taps(src_len: u32, dst_len: u32) -> Vec<Taps> {
    let ratio = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|d| {
            let start = f64::from(d) * ratio;
            let end = (f64::from(d) + 1.0) * ratio;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let lo = start.max(f64::from(s));
                    let hi = end.min(f64::from(s) + 1.0);
                    let coverage = hi - lo;
                    (coverage > 1e-9).then_some((s, coverage / ratio))
                })
                .collect()
        })
        .collect()
}

/// Area-averaging resize to exactly `width` x `height`.
///
/// Intended for shrinking; both target sides must be non-zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn area_resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let x_taps = area_taps(image.width(), width);
    let y_taps = area_taps(image.height(), height);

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0.0_f64; 3];
        for &(sy, wy) in &y_taps[y as usize] {
            for &(sx, wx) in &x_taps[x as usize] {
                let px = image.get_pixel(sx, sy).0;
                let w = wy * wx;
                for (a, &c) in acc.iter_mut().zip(&px) {
                    *a = f64::from(c).mul_add(w, *a);
                }
            }
        }
        image::Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
    })
}
