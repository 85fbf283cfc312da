//! Product image upload handling.
//!
//! Uploaded images are written under the configured image directory and
//! served back at `/images/{name}`. Filenames are regenerated from a
//! timestamp plus a sanitized stem so uploads can never escape the directory
//! or collide in practice.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file is not a supported image type.
    #[error("unsupported image type")]
    UnsupportedType,

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the uploaded content type is an accepted image format.
#[must_use]
pub fn is_supported_image(content_type: &str) -> bool {
    matches!(content_type, "image/png" | "image/jpeg" | "image/jpg")
}

/// File extension for an accepted content type.
const fn extension_for(content_type: &str) -> &'static str {
    match content_type.as_bytes() {
        b"image/png" => "png",
        _ => "jpg",
    }
}

/// Reduce an uploaded filename to a safe stem.
///
/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn sanitize_stem(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned
    }
}

/// Build the stored filename for an upload.
fn stored_filename(original: &str, content_type: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        sanitize_stem(original),
        extension_for(content_type)
    )
}

/// Write an uploaded image to the image directory.
///
/// Returns the public URL path (`/images/{name}`) to store on the product.
///
/// # Errors
///
/// Returns `UploadError::UnsupportedType` for non-image content types,
/// `UploadError::Io` if the write fails.
pub async fn save_image(
    image_dir: &Path,
    original_filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<String, UploadError> {
    if !is_supported_image(content_type) {
        return Err(UploadError::UnsupportedType);
    }

    let name = stored_filename(original_filename, content_type);
    tokio::fs::write(image_dir.join(&name), bytes).await?;

    Ok(format!("/images/{name}"))
}

/// Delete a previously stored image, best effort.
///
/// Called after a product is updated with a new image or deleted. A missing
/// file is logged and ignored; the database is already consistent.
pub async fn delete_image(image_dir: &Path, image_url: &str) {
    let Some(path) = disk_path(image_dir, image_url) else {
        tracing::warn!(image_url = %image_url, "Refusing to delete image outside image dir");
        return;
    };

    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to delete image file");
    }
}

/// Map a stored `/images/{name}` URL back to its on-disk path.
///
/// Returns `None` for URLs that do not point at a plain file in the image
/// directory.
fn disk_path(image_dir: &Path, image_url: &str) -> Option<PathBuf> {
    let name = image_url.strip_prefix("/images/")?;
    if name.is_empty() || name.contains('/') || name.contains("..") {
        return None;
    }
    Some(image_dir.join(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_image_types() {
        assert!(is_supported_image("image/png"));
        assert!(is_supported_image("image/jpeg"));
        assert!(is_supported_image("image/jpg"));
        assert!(!is_supported_image("image/gif"));
        assert!(!is_supported_image("application/pdf"));
        assert!(!is_supported_image("text/html"));
    }

    #[test]
    fn test_sanitize_stem_strips_path_components() {
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("photo of cat.png"), "photo_of_cat");
        assert_eq!(sanitize_stem("clean-name_1.jpg"), "clean-name_1");
    }

    #[test]
    fn test_sanitize_stem_never_empty() {
        assert_eq!(sanitize_stem(""), "image");
    }

    #[test]
    fn test_stored_filename_extension_follows_content_type() {
        let name = stored_filename("cat.png", "image/png");
        assert!(name.ends_with(".png"));

        let name = stored_filename("cat.png", "image/jpeg");
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_disk_path_rejects_traversal() {
        let dir = Path::new("/srv/images");
        assert!(disk_path(dir, "/images/../secret").is_none());
        assert!(disk_path(dir, "/images/a/b").is_none());
        assert!(disk_path(dir, "/other/x.png").is_none());
        assert!(disk_path(dir, "/images/").is_none());

        let path = disk_path(dir, "/images/x.png").unwrap();
        assert_eq!(path, Path::new("/srv/images/x.png"));
    }
}
