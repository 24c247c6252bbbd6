//! Binarization for line-art scans.
//!
//! Grayscale input is split into a two-level mask at the threshold
//! chosen by Otsu's method, optionally inverted, and optionally cleaned
//! with a morphological opening that removes specks smaller than the
//! structuring element while leaving larger regions intact.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_open};

/// Foreground value in a binary mask.
pub const FOREGROUND: u8 = 255;
/// Background value in a binary mask.
pub const BACKGROUND: u8 = 0;

/// Threshold `image` at its Otsu level.
///
/// Pixels strictly brighter than the level become [`FOREGROUND`],
/// everything else [`BACKGROUND`]. Returns the mask and the level used.
#[must_use]
pub fn otsu_binarize(image: &GrayImage) -> (GrayImage, u8) {
    let level = imageproc::contrast::otsu_level(image);
    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] > level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });
    (mask, level)
}

/// Invert a binary mask (bitwise NOT).
#[must_use = "returns the inverted mask"]
pub fn invert(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([!mask.get_pixel(x, y).0[0]])
    })
}

/// Morphological opening (erosion then dilation) with a `size` x `size`
/// square structuring element.
///
/// The element's anchor is at offset `size / 2`, so odd sizes are
/// centred. Even sizes have the anchor past the middle, and regions that
/// survive move one pixel down and right. Pixels outside the image never
/// constrain the result. Sizes of 0 and 1 return the mask unchanged.
#[must_use = "returns the opened mask"]
pub fn open(mask: &GrayImage, size: u8) -> GrayImage {
    if size <= 1 {
        return mask.clone();
    }
    let side = u32::from(size);
    let square = GrayImage::from_pixel(side, side, Luma([FOREGROUND]));
    let element = Mask::from_image(&square, size / 2, size / 2);
    grayscale_open(mask, &element)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_foreground(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    #[test]
    fn otsu_splits_bimodal_image() {
        let img = GrayImage::from_fn(20, 10, |x, _| {
            if x < 10 { Luma([30]) } else { Luma([220]) }
        });
        let (mask, level) = otsu_binarize(&img);
        assert!((30..220).contains(&level), "level {level}");
        assert_eq!(mask.get_pixel(0, 0).0[0], BACKGROUND);
        assert_eq!(mask.get_pixel(19, 9).0[0], FOREGROUND);
        assert_eq!(count_foreground(&mask), 100);
    }

    #[test]
    fn mask_is_two_level() {
        let img = GrayImage::from_fn(16, 16, |x, y| {
            Luma([u8::try_from((x * 16 + y) % 256).unwrap_or(0)])
        });
        let (mask, _) = otsu_binarize(&img);
        assert!(
            mask.pixels()
                .all(|p| p.0[0] == FOREGROUND || p.0[0] == BACKGROUND)
        );
    }

    #[test]
    fn invert_flips_values() {
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(1, 1, Luma([FOREGROUND]));
        let inverted = invert(&mask);
        assert_eq!(inverted.get_pixel(1, 1).0[0], BACKGROUND);
        assert_eq!(inverted.get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(invert(&inverted), mask);
    }

    #[test]
    fn opening_removes_small_specks() {
        let mut mask = GrayImage::new(20, 20);
        // 1x1 and 2x2 specks.
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        for (x, y) in [(6, 6), (7, 6), (6, 7), (7, 7)] {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        let opened = open(&mask, 3);
        assert_eq!(count_foreground(&opened), 0);
    }

    #[test]
    fn opening_preserves_large_regions() {
        let mask = GrayImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        });
        let opened = open(&mask, 3);
        assert_eq!(opened, mask);
    }

    #[test]
    fn opening_keeps_regions_touching_border() {
        let mask = GrayImage::from_fn(10, 10, |x, _| {
            if x < 4 { Luma([FOREGROUND]) } else { Luma([BACKGROUND]) }
        });
        assert_eq!(open(&mask, 3), mask);
    }

    #[test]
    fn size_zero_and_one_are_identity() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        assert_eq!(open(&mask, 0), mask);
        assert_eq!(open(&mask, 1), mask);
    }

    #[test]
    fn even_kernel_shifts_survivors_down_right() {
        // A 2x2 element anchored at (1, 1): erosion keeps pixels whose
        // up/left neighbours are set, dilation grows them back down/right.
        let mut mask = GrayImage::new(12, 12);
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        for x in 0..12 {
            mask.put_pixel(x, 9, Luma([FOREGROUND]));
        }
        let opened = open(&mask, 2);
        assert_eq!(count_foreground(&opened), 4);
        for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
            assert_eq!(opened.get_pixel(x, y).0[0], FOREGROUND, "({x}, {y})");
        }
    }

    #[test]
    fn even_kernel_removes_blocks_narrower_than_the_element() {
        let mask = GrayImage::from_fn(16, 16, |x, y| {
            let block = (2..5).contains(&x) && (2..5).contains(&y);
            let bar = (8..14).contains(&x) && (10..13).contains(&y);
            if block || bar { Luma([FOREGROUND]) } else { Luma([BACKGROUND]) }
        });
        assert_eq!(count_foreground(&open(&mask, 4)), 0);

        // Both fit a 2x2 element and survive at full size.
        let opened = open(&mask, 2);
        assert_eq!(count_foreground(&opened), 9 + 18);
        assert_eq!(opened.get_pixel(2, 2).0[0], BACKGROUND);
        assert_eq!(opened.get_pixel(5, 5).0[0], FOREGROUND);
    }
}
