//! Real-world measurement from a two-point calibration.
//!
//! The operator marks two points on the image a known distance apart
//! (for example the ends of a scale bar) and names the unit; traced
//! areas can then be reported in that unit.

use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point};

/// Pixels-per-unit scale derived from two image points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// First reference point, in original-image pixels.
    pub p1: Point,
    /// Second reference point, in original-image pixels.
    pub p2: Point,
    /// Real distance between the points.
    pub real_length: f64,
    /// Unit label (e.g. `"m"`, `"ft"`).
    pub unit: String,
}

impl Calibration {
    /// Build a calibration.
    ///
    /// Returns `None` if the points coincide or `real_length` is not a
    /// positive finite number.
    #[must_use]
    pub fn new(p1: Point, p2: Point, real_length: f64, unit: impl Into<String>) -> Option<Self> {
        let pixels = p1.distance(p2);
        if !(pixels > 0.0 && pixels.is_finite() && real_length > 0.0 && real_length.is_finite()) {
            return None;
        }
        Some(Self {
            p1,
            p2,
            real_length,
            unit: unit.into(),
        })
    }

    /// Image pixels per real unit of length.
    #[must_use]
    pub fn pixels_per_unit(&self) -> f64 {
        self.p1.distance(self.p2) / self.real_length
    }

    /// Convert a pixel area to square real units.
    #[must_use]
    pub fn area_in_units(&self, square_pixels: f64) -> f64 {
        let ppu = self.pixels_per_unit();
        square_pixels / (ppu * ppu)
    }

    /// Area of `contour` in square real units.
    #[must_use]
    pub fn contour_area(&self, contour: &Contour) -> f64 {
        self.area_in_units(contour.area)
    }
}
