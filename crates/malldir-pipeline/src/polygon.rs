//! Closed-polygon measures.

use crate::types::Point;

/// Perimeter of the closed polygon through `points`, including the
/// edge from the last point back to the first.
#[must_use]
pub fn closed_perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&a, &b)| a.distance(b))
        .sum()
}

/// Unsigned area enclosed by `points`, by the shoelace formula.
///
/// Self-intersecting polygons report the absolute signed sum, as the
/// formula does.
#[must_use]
pub fn shoelace_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    twice.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ]
    }

    #[test]
    fn square_perimeter_closes_the_ring() {
        assert!((closed_perimeter(&square(10.0)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn square_area() {
        assert!((shoelace_area(&square(10.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn area_ignores_winding_direction() {
        let mut pts = square(4.0);
        pts.reverse();
        assert!((shoelace_area(&pts) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn triangle_area() {
        let pts = [Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(30.0, 40.0)];
        assert!((shoelace_area(&pts) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert!(shoelace_area(&[]).abs() < f64::EPSILON);
        assert!(shoelace_area(&square(1.0)[..2]).abs() < f64::EPSILON);
        assert!(closed_perimeter(&[Point::new(1.0, 1.0)]).abs() < f64::EPSILON);
    }

    #[test]
    fn two_point_perimeter_is_out_and_back() {
        let pts = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
        assert!((closed_perimeter(&pts) - 10.0).abs() < 1e-9);
    }
}
