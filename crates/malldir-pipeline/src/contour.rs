//! Outer-boundary tracing on a binary edge map.
//!
//! Suzuki-Abe border following via `imageproc::contours::find_contours`,
//! keeping only top-level outer borders: a storefront outline drawn as a
//! ring of edge pixels yields one boundary, not the ring's inner hole or
//! anything nested inside the shop.
//!
//! Boundaries are compressed so that only the pixels where the chain
//! changes direction survive. Straight horizontal, vertical and diagonal
//! runs collapse to their end points.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::types::{Point, Polyline};

/// Trace the outer boundaries of all foreground (non-zero) regions.
///
/// Output is in raster-scan order of each boundary's starting pixel and
/// is deterministic for a given edge map.
#[must_use]
pub fn trace_outer_boundaries(edges: &GrayImage) -> Vec<Polyline> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let chain: Vec<(i32, i32)> = c.points.iter().map(|p| (p.x, p.y)).collect();
            let points = compress_chain(&chain)
                .into_iter()
                .map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
                .collect();
            Polyline::new(points)
        })
        .filter(|pl| !pl.is_empty())
        .collect()
}

/// Keep only the points of a closed pixel chain where the step direction
/// changes.
///
/// The chain is treated as cyclic: the step into the first point comes
/// from the last. Chains of fewer than three points are returned as-is.
/// A chain whose points all lie on one line (a bare segment traced out
/// and back) keeps its two turning ends.
#[must_use]
pub fn compress_chain(chain: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let n = chain.len();
    if n < 3 {
        return chain.to_vec();
    }

    let step = |from: (i32, i32), to: (i32, i32)| ((to.0 - from.0).signum(), (to.1 - from.1).signum());

    let kept: Vec<(i32, i32)> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let cur = chain[i];
            let next = chain[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| chain[i])
        .collect();

    if kept.is_empty() {
        // Every step identical can only happen for a degenerate chain of
        // repeated points.
        return vec![chain[0]];
    }
    kept
}
