//! SVG export serializer.
//!
//! Each contour becomes one `<path>` element whose data moves to the
//! first vertex, draws a line to every following vertex and closes the
//! path. The document's `width`, `height` and `viewBox` are the source
//! image's pixel dimensions, so coordinates are used as-is.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use malldir_pipeline::{Contour, Dimensions, Polyline};

use crate::ExportError;

/// Stroke attributes shared by every path.
const PATH_STYLE: &str = r#"fill="none" stroke="green" stroke-width="2""#;

/// Build the `d` attribute for a closed polygon: `M x0,y0 L x1,y1 ... Z`.
///
/// Coordinates use Rust's shortest round-trip formatting, so whole
/// numbers are written without a fractional part. Returns an empty
/// string for an empty polyline.
///
/// # Examples
///
/// ```
/// use malldir_pipeline::{Point, Polyline};
/// use malldir_export::path_data;
///
/// let triangle = Polyline::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(5.0, 10.5),
/// ]);
/// assert_eq!(path_data(&triangle), "M 0,0 L 10,0 L 5,10.5 Z");
/// ```
#[must_use]
pub fn path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    let Some(first) = points.first() else {
        return String::new();
    };

    let mut d = format!("M {},{}", first.x, first.y);
    for p in &points[1..] {
        let _ = write!(d, " L {},{}", p.x, p.y);
    }
    d.push_str(" Z");
    d
}

/// Serialize contours into an SVG document string.
///
/// # Errors
///
/// Returns [`ExportError::NoContours`] if `contours` is empty.
///
/// # Examples
///
/// ```
/// use malldir_pipeline::{Contour, ContourId, Dimensions, Point, Polyline};
/// use malldir_export::to_svg;
///
/// let contour = Contour {
///     id: ContourId(0),
///     vertices: Polyline::new(vec![
///         Point::new(1.0, 1.0),
///         Point::new(9.0, 1.0),
///         Point::new(5.0, 8.0),
///     ]),
///     area: 28.0,
/// };
/// let svg = to_svg(&[contour], Dimensions { width: 10, height: 10 }).unwrap();
/// assert!(svg.contains(r#"<path d="M 1,1 L 9,1 L 5,8 Z""#));
/// ```
pub fn to_svg(contours: &[Contour], dimensions: Dimensions) -> Result<String, ExportError> {
    if contours.is_empty() {
        return Err(ExportError::NoContours);
    }

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = dimensions.width,
        h = dimensions.height,
    );
    for contour in contours {
        let d = path_data(&contour.vertices);
        if d.is_empty() {
            continue;
        }
        let _ = writeln!(out, r#"  <path d="{d}" {PATH_STYLE} />"#);
    }
    out.push_str("</svg>\n");
    Ok(out)
}
