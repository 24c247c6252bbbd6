//! Path simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count by removing points within a given tolerance of
//! the line between their kept neighbours. Boundaries are closed rings,
//! so the recursion runs between two anchors chosen on the ring rather
//! than between fixed endpoints.

use crate::types::{Point, Polyline};

/// Simplify a closed polygon (last point joins the first implicitly).
///
/// The polygon is split at point 0 and at the point farthest from it;
/// both halves are simplified as open chains, the second one wrapping
/// back to point 0. Polygons with fewer than 3 points are returned
/// unchanged. If every point coincides with point 0 only that point is
/// returned.
#[must_use = "returns the simplified polygon"]
pub fn simplify_closed(polygon: &Polyline, tolerance: f64) -> Polyline {
    let points = polygon.points();
    let n = points.len();
    if n < 3 {
        return polygon.clone();
    }

    let origin = points[0];
    let (far, far_dist) = points
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, &p)| (i, p.distance_squared(origin)))
        .fold((0, 0.0), |best, cand| if cand.1 > best.1 { cand } else { best });
    if far_dist == 0.0 {
        return Polyline::new(vec![origin]);
    }

    // Repeat point 0 at the end so the second half is an ordinary chain.
    let mut ring = points.to_vec();
    ring.push(origin);
    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[far] = true;

    rdp_recurse(&ring, 0, far, tolerance, &mut kept);
    rdp_recurse(&ring, far, n, tolerance, &mut kept);

    kept[n] = false;
    Polyline::new(keep_marked(&ring, &kept))
}

fn keep_marked(points: &[Point], kept: &[bool]) -> Vec<Point> {
    points
        .iter()
        .zip(kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
#[must_use]
pub fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
