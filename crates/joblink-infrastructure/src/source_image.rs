//! Reading files from disk into staged source images.
//!
//! The media type is inferred from the extension and declared as-is; whether
//! it is acceptable is the controller's decision, not this loader's.

use std::path::Path;

use joblink_core::assistant::SourceImage;
use joblink_core::error::{JobLinkError, Result};

/// Infers the MIME type from a filename extension using the `mime_guess` library.
pub fn infer_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Reads `path` into a [`SourceImage`] with its inferred media type.
pub async fn load_source_image(path: &Path) -> Result<SourceImage> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| JobLinkError::io(format!("Failed to read {}: {e}", path.display())))?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceImage::new(name, infer_media_type(path), bytes))
}
