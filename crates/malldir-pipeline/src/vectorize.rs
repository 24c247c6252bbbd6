//! Turning raw traced boundaries into accepted contours.
//!
//! Per boundary: simplify with a perimeter-relative tolerance, measure
//! the area of the unsimplified boundary, filter, and map back to
//! source-image coordinates. Optional rectilinear snapping runs last,
//! on source-image coordinates.

use crate::polygon;
use crate::rectilinear;
use crate::simplify;
use crate::types::{Contour, ContourId, PipelineParameters, Polyline};

/// Minimum vertex count of an accepted contour.
pub const MIN_VERTICES: usize = 3;

/// Simplify, filter and rescale `boundaries` traced at `scale`.
///
/// Each accepted contour's id is its boundary's index in `boundaries`.
/// `min_area` is compared against the area on the working buffer; the
/// reported area is in source-image pixels.
#[must_use]
pub fn vectorize(boundaries: &[Polyline], params: &PipelineParameters, scale: f64) -> Vec<Contour> {
    boundaries
        .iter()
        .enumerate()
        .filter_map(|(index, boundary)| accept(index, boundary, params, scale))
        .collect()
}

fn accept(index: usize, boundary: &Polyline, params: &PipelineParameters, scale: f64) -> Option<Contour> {
    let points = boundary.points();
    let epsilon = params.approx_epsilon_percent * polygon::closed_perimeter(points) / 100.0;
    let simplified = simplify::simplify_closed(boundary, epsilon);

    let area = polygon::shoelace_area(points);
    if area < f64::from(params.min_area) || simplified.len() < MIN_VERTICES {
        return None;
    }

    let rescaled = Polyline::new(
        simplified
            .into_points()
            .into_iter()
            .map(|p| p.unscale(scale))
            .collect(),
    );
    let vertices = match &params.rectilinear {
        Some(settings) => rectilinear::snap(&rescaled, settings),
        None => rescaled,
    };
    if vertices.len() < MIN_VERTICES {
        return None;
    }

    Some(Contour {
        id: ContourId(index),
        vertices,
        area: area / (scale * scale),
    })
}
