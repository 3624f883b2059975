//! Input resolution: turn a user-selected file into an [`EncodedImage`].
//!
//! No size or format check happens here. The CLI only offers PNG, JPEG and
//! WebP, but anything readable is accepted and passed on; the remote model
//! is the one that decides whether it can use it.

use crate::error::EnhanceError;
use crate::pipeline::encode::{encode_bytes, EncodedImage};
use std::path::Path;
use tracing::{debug, warn};

/// Media type used when the file extension is not a known image format.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// File types offered by the file picker. Advisory only.
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Read `path` fully and encode it for transmission.
pub async fn read_image_file(path: impl AsRef<Path>) -> Result<EncodedImage, EnhanceError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|source| {
        warn!("Could not read {}: {}", path.display(), source);
        EnhanceError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let media_type = media_type_for(path);
    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(
        "Read {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        media_type
    );

    Ok(encode_bytes(&bytes, media_type, display_name))
}

/// Declared media type, derived from the file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

/// Whether the file picker would normally offer this media type.
pub fn is_accepted_media_type(media_type: &str) -> bool {
    ACCEPTED_MEDIA_TYPES.contains(&media_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for(&PathBuf::from("a/b/cat.png")), "image/png");
        assert_eq!(media_type_for(&PathBuf::from("cat.JPG")), "image/jpeg");
        assert_eq!(media_type_for(&PathBuf::from("cat.webp")), "image/webp");
        assert_eq!(media_type_for(&PathBuf::from("notes")), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn accepted_types_are_advisory() {
        assert!(is_accepted_media_type("image/png"));
        assert!(!is_accepted_media_type("image/gif"));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = read_image_file("/definitely/not/here.png").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FileRead);
        assert_eq!(err.to_string(), "Failed to read the image file.");
    }

    #[tokio::test]
    async fn reads_and_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let img = read_image_file(&path).await.unwrap();
        assert_eq!(img.display_name, "tiny.png");
        assert_eq!(img.media_type, "image/png");
        assert_eq!(img.payload, "iVBORw==");
    }
}
