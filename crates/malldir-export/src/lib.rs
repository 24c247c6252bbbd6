//! malldir-export: Pure renderers for traced contours (sans-IO)
//!
//! Turns an accepted contour set into the two artifacts an operator
//! takes away from a session: an SVG document with one closed path per
//! storefront, and the original image with the outlines drawn over it.
//! Everything here returns in-memory values; writing files is the
//! caller's job.

pub mod overlay;
pub mod svg;

pub use overlay::{encode_png, render_overlay};
pub use svg::{path_data, to_svg};

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// There are no contours to export.
    #[error("no contours to export")]
    NoContours,

    /// Encoding the overlay image failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}
