//! Result types: the enhanced image, display handles, and download naming.

use crate::error::EnhanceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Suffix appended to the source name when the result is downloaded.
pub const DEFAULT_RESULT_SUFFIX: &str = "aethercanvas";

/// Image returned by the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedImage {
    /// Media type declared by the remote API, e.g. `image/png`.
    pub media_type: String,
    /// Base64 payload exactly as received.
    pub payload: String,
}

impl EnhancedImage {
    pub fn new(media_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            payload: payload.into(),
        }
    }

    /// `data:<media_type>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.payload)
    }

    /// Decode the payload to raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, EnhanceError> {
        STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| EnhanceError::Internal(format!("result payload is not valid base64: {e}")))
    }
}

/// Opaque reference to something a viewer can display.
///
/// Both the source preview and the result preview are data URIs, so a
/// presentation layer can hand them straight to an `<img>`-like widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for PreviewHandle {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derive the download name for an enhanced image.
///
/// `photo.final.jpg` with suffix `aethercanvas` becomes
/// `photo.final-aethercanvas.jpg`. A name without an extension (no dot, or
/// only a leading dot such as `.hidden`) gets the suffix and no extension.
pub fn result_file_name(original: &str, suffix: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() || is_image_extension(ext) => {
            format!("{stem}-{suffix}.{ext}")
        }
        _ => format!("{original}-{suffix}"),
    }
}

fn is_image_extension(ext: &str) -> bool {
    image::ImageFormat::from_extension(ext).is_some()
}

/// Write the decoded result to `path`.
///
/// Uses a temp file in the destination directory followed by a rename so a
/// crash never leaves a half-written image behind.
pub fn save_result(image: &EnhancedImage, path: &Path) -> Result<(), EnhanceError> {
    let bytes = image.decode()?;
    let write_err = |source: std::io::Error| EnhanceError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
