//! Atomic file output.
//!
//! Exports are written to a temporary file in the destination
//! directory and renamed over the target only once fully written, so a
//! failed export never leaves a truncated file behind.

use std::io::Write;
use std::path::Path;

use malldir_export::ExportError;

/// Errors that can occur while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Creating or writing the temporary file failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Renaming the temporary file over the destination failed.
    #[error("could not replace destination: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The content could not be encoded.
    #[error(transparent)]
    Encode(#[from] ExportError),
}

/// Write `bytes` to `path`, replacing any existing file atomically.
///
/// # Errors
///
/// Returns [`SaveError::Io`] if the temporary file cannot be created or
/// written, and [`SaveError::Persist`] if it cannot be moved into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

/// Encode `image` as PNG and write it to `path` atomically.
///
/// # Errors
///
/// Returns [`SaveError::Encode`] if encoding fails, otherwise as
/// [`write_atomic`].
pub fn write_png(path: &Path, image: &image::RgbImage) -> Result<(), SaveError> {
    let png = malldir_export::encode_png(image)?;
    write_atomic(path, &png)
}
