//! Overlay rendering: accepted outlines drawn over the source image.
//!
//! Strokes go through `tiny-skia`, starting from an opaque copy of the
//! original pixels. Anti-aliasing is off so every touched pixel is the
//! exact highlight colour and the rest of the image is left untouched.

use image::{ImageEncoder, Rgb, RgbImage};
use malldir_pipeline::{Contour, Polyline, RasterImage};
use tiny_skia::{IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::ExportError;

/// Outline colour.
pub const HIGHLIGHT: [u8; 3] = [0, 255, 0];

/// Outline width in pixels.
pub const STROKE_WIDTH: f32 = 2.0;

/// Draw every contour's closed outline over a copy of `image`.
///
/// The source image is not modified. Contours with fewer than two
/// vertices draw nothing.
#[must_use]
pub fn render_overlay(image: &RasterImage, contours: &[Contour]) -> RgbImage {
    let base = image.pixels();
    let Some(mut pixmap) = to_pixmap(base) else {
        return base.clone();
    };

    let stroke = Stroke {
        width: STROKE_WIDTH,
        line_cap: LineCap::Square,
        line_join: LineJoin::Miter,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(HIGHLIGHT[0], HIGHLIGHT[1], HIGHLIGHT[2], 255);
    paint.anti_alias = false;

    for contour in contours {
        if let Some(path) = closed_path(&contour.vertices) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    from_pixmap(&pixmap)
}

/// Closed path through the pixel centres of `polyline`'s vertices.
#[allow(clippy::cast_possible_truncation)]
fn closed_path(polyline: &Polyline) -> Option<tiny_skia::Path> {
    let points = polyline.points();
    if points.len() < 2 {
        return None;
    }
    let centre = |v: f64| (v + 0.5) as f32;

    let mut pb = PathBuilder::new();
    pb.move_to(centre(points[0].x), centre(points[0].y));
    for p in &points[1..] {
        pb.line_to(centre(p.x), centre(p.y));
    }
    pb.close();
    pb.finish()
}

/// Opaque RGBA pixmap holding `image`. Fully opaque pixels are the same
/// premultiplied or not.
fn to_pixmap(image: &RgbImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2], 255])
        .collect();
    Pixmap::from_vec(data, size)
}

fn from_pixmap(pixmap: &Pixmap) -> RgbImage {
    RgbImage::from_fn(pixmap.width(), pixmap.height(), |x, y| {
        pixmap
            .pixel(x, y)
            .map_or(Rgb([0, 0, 0]), |c| Rgb([c.red(), c.green(), c.blue()]))
    })
}

/// Encode an RGB image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if PNG encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(png_bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use malldir_pipeline::{ContourId, Point};

    use super::*;

    fn gray_page(w: u32, h: u32) -> RasterImage {
        RasterImage::new(RgbImage::from_pixel(w, h, Rgb([200, 200, 200])))
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        Contour {
            id: ContourId(0),
            vertices: Polyline::new(vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ]),
            area: (x1 - x0) * (y1 - y0),
        }
    }

    fn is_highlight(img: &RgbImage, x: u32, y: u32) -> bool {
        img.get_pixel(x, y).0 == HIGHLIGHT
    }

    #[test]
    fn no_contours_returns_identical_copy() {
        let page = gray_page(20, 20);
        assert_eq!(&render_overlay(&page, &[]), page.pixels());
    }

    #[test]
    fn outline_is_drawn_on_every_edge() {
        let out = render_overlay(&gray_page(40, 40), &[square(10.0, 10.0, 30.0, 30.0)]);
        assert!(is_highlight(&out, 20, 10), "top edge");
        assert!(is_highlight(&out, 30, 20), "right edge");
        assert!(is_highlight(&out, 20, 30), "bottom edge");
        assert!(is_highlight(&out, 10, 20), "left edge (closing segment)");
    }

    #[test]
    fn interior_and_exterior_are_untouched() {
        let out = render_overlay(&gray_page(40, 40), &[square(10.0, 10.0, 30.0, 30.0)]);
        assert_eq!(out.get_pixel(20, 20).0, [200, 200, 200]);
        assert_eq!(out.get_pixel(2, 2).0, [200, 200, 200]);
    }

    #[test]
    fn source_image_is_not_modified() {
        let page = gray_page(40, 40);
        let _ = render_overlay(&page, &[square(10.0, 10.0, 30.0, 30.0)]);
        assert!(page.pixels().pixels().all(|p| p.0 == [200, 200, 200]));
    }

    #[test]
    fn stroke_is_about_two_pixels_wide() {
        let out = render_overlay(&gray_page(40, 40), &[square(10.0, 10.0, 30.0, 30.0)]);
        let across = (5..16).filter(|&y| is_highlight(&out, 20, y)).count();
        assert!((1..=3).contains(&across), "stroke width {across}");
    }

    #[test]
    fn png_round_trips_dimensions() {
        let out = render_overlay(&gray_page(13, 7), &[]);
        let png = encode_png(&out).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (13, 7));
    }
}
