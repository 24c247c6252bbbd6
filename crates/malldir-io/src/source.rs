//! Acquiring a raster image from a file or the system clipboard.
//!
//! Both sources normalize to an 8-bit RGB [`RasterImage`]; alpha is
//! dropped.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use malldir_pipeline::{PipelineError, RasterImage, grayscale};

/// Errors that can occur while acquiring an image.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes are not a supported image.
    #[error(transparent)]
    Decode(#[from] PipelineError),

    /// The clipboard holds no image.
    #[error("no image found in clipboard")]
    ClipboardEmpty,

    /// The clipboard could not be accessed, or held malformed image data.
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

/// Read and decode an image file (PNG, JPEG, BMP, WebP, TIFF).
///
/// # Errors
///
/// Returns [`SourceError::Read`] if the file cannot be read, or
/// [`SourceError::Decode`] if its contents are not a supported image.
pub fn load_file(path: &Path) -> Result<RasterImage, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(grayscale::decode(&bytes)?)
}

/// Grab the image currently on the system clipboard.
///
/// # Errors
///
/// Returns [`SourceError::ClipboardEmpty`] if the clipboard holds no
/// image, or [`SourceError::Clipboard`] if the clipboard is unavailable.
pub fn paste_clipboard() -> Result<RasterImage, SourceError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;
    let data = clipboard.get_image().map_err(|e| match e {
        arboard::Error::ContentNotAvailable => SourceError::ClipboardEmpty,
        other => SourceError::Clipboard(other.to_string()),
    })?;
    from_rgba(data.width, data.height, data.bytes.into_owned())
}

/// Build a [`RasterImage`] from tightly packed RGBA bytes.
///
/// # Errors
///
/// Returns [`SourceError::ClipboardEmpty`] for a zero-sized image and
/// [`SourceError::Clipboard`] if the buffer length does not match the
/// dimensions.
pub fn from_rgba(width: usize, height: usize, bytes: Vec<u8>) -> Result<RasterImage, SourceError> {
    if width == 0 || height == 0 {
        return Err(SourceError::ClipboardEmpty);
    }
    let too_large = || SourceError::Clipboard(format!("image too large: {width}x{height}"));
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;
    let len = bytes.len();
    let rgba = RgbaImage::from_raw(w, h, bytes).ok_or_else(|| {
        SourceError::Clipboard(format!("{len} bytes do not fill a {w}x{h} RGBA image"))
    })?;
    Ok(RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba)))
}
