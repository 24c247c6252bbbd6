//! Right-angle snapping for rectilinear floor plans.
//!
//! Mall directories are mostly drawn with axis-aligned walls, but a
//! traced outline comes back with edges a few degrees off. Snapping walks
//! the polygon once, making each edge that is within the tolerance of
//! horizontal or vertical exactly so, optionally rounds vertices to a
//! grid, and finally merges vertices left collinear by the snapping.

use crate::types::{Point, Polyline, RectilinearSnap};

/// Squared distance below which consecutive vertices are merged.
const COINCIDENT_SQ: f64 = 1e-12;

/// Relative cross-product magnitude below which three vertices count
/// as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

/// Snap a closed polygon's edges to the nearest right angle.
///
/// Each vertex is adjusted relative to the already-snapped previous
/// vertex: an edge within `angle_tolerance_deg` of horizontal gets the
/// previous vertex's `y`, one within the tolerance of vertical gets its
/// `x`. The closing edge is left as the neighbours determine it.
///
/// The result may have fewer than 3 vertices; callers decide whether
/// the polygon survives.
#[must_use = "returns the snapped polygon"]
pub fn snap(polygon: &Polyline, settings: &RectilinearSnap) -> Polyline {
    let points = polygon.points();
    let Some(&first) = points.first() else {
        return polygon.clone();
    };

    let grid = |p: Point| round_to_grid(p, settings.grid_snap);
    let mut snapped = Vec::with_capacity(points.len());
    snapped.push(grid(first));

    for &p in &points[1..] {
        let prev = snapped[snapped.len() - 1];
        let adjusted = match classify(prev, p, settings.angle_tolerance_deg) {
            Some(Axis::Horizontal) => Point::new(p.x, prev.y),
            Some(Axis::Vertical) => Point::new(prev.x, p.y),
            None => p,
        };
        snapped.push(grid(adjusted));
    }

    Polyline::new(merge_collinear(snapped))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Which axis the edge `a -> b` is close to, if any.
fn classify(a: Point, b: Point, tolerance_deg: f64) -> Option<Axis> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    // Angle from the horizontal, folded into [0, 90].
    let angle = dy.abs().atan2(dx.abs()).to_degrees();
    if angle <= tolerance_deg {
        Some(Axis::Horizontal)
    } else if 90.0 - angle <= tolerance_deg {
        Some(Axis::Vertical)
    } else {
        None
    }
}

fn round_to_grid(p: Point, spacing: f64) -> Point {
    if spacing <= 0.0 {
        return p;
    }
    Point::new(
        (p.x / spacing).round() * spacing,
        (p.y / spacing).round() * spacing,
    )
}

/// Remove coincident and collinear vertices from a closed ring.
///
/// Repeats until stable, since removing one vertex can make its
/// neighbours collinear.
#[must_use]
pub fn merge_collinear(mut ring: Vec<Point>) -> Vec<Point> {
    loop {
        let n = ring.len();
        if n < 3 {
            ring.dedup_by(|a, b| a.distance_squared(*b) < COINCIDENT_SQ);
            return ring;
        }
        let redundant = (0..n).find(|&i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            is_redundant(prev, cur, next)
        });
        match redundant {
            Some(i) => {
                ring.remove(i);
            }
            None => return ring,
        }
    }
}

/// `cur` adds nothing to the ring if it coincides with `prev` or lies
/// on the straight line from `prev` to `next`.
fn is_redundant(prev: Point, cur: Point, next: Point) -> bool {
    if cur.distance_squared(prev) < COINCIDENT_SQ {
        return true;
    }
    let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
    let (bx, by) = (next.x - cur.x, next.y - cur.y);
    let cross = ax.mul_add(by, -(ay * bx));
    let scale = ax.hypot(ay) * bx.hypot(by);
    let dot = ax.mul_add(bx, ay * by);
    // Collinear and continuing forward; a reversal is a spike, keep it.
    scale == 0.0 || (cross.abs() <= COLLINEAR_EPS * scale && dot > 0.0)
}
