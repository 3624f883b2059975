//! Error types for the aethercanvas library.
//!
//! A single enum, [`EnhanceError`], covers every failure the workflow can
//! report. The five workflow kinds (`FileRead`, `MissingImage`,
//! `NoImageInResponse`, `InvalidCredential`, `RemoteFailure`) render exactly
//! the message a user sees in the error banner, so the orchestrator can store
//! `err.to_string()` without further formatting.
//!
//! Callers that need to branch on the cause rather than the text use
//! [`EnhanceError::kind`], which returns a copyable, serialisable
//! [`ErrorKind`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Substring the remote API puts in its error text when the credential is rejected.
pub const INVALID_CREDENTIAL_MARKER: &str = "API key not valid";

/// All errors returned by the aethercanvas library.
#[derive(Debug, Error)]
pub enum EnhanceError {
    // ── Workflow errors ───────────────────────────────────────────────────
    /// The selected file could not be read.
    #[error("Failed to read the image file.")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Submit was requested before any image was uploaded.
    #[error("Please upload an image first.")]
    MissingImage,

    /// The remote model answered, but no part carried inline image data.
    #[error("No image data found in the API response.")]
    NoImageInResponse,

    /// The remote API rejected the credential.
    #[error("The API key is invalid. Please check your configuration.")]
    InvalidCredential,

    /// Any other failure of the remote call; `message` is the upstream text.
    #[error("Failed to process image. {message}")]
    RemoteFailure { message: String },

    // ── Parameter errors ──────────────────────────────────────────────────
    /// A transform parameter was outside its allowed set or range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API key was found in the configuration or environment.
    #[error("No API key configured.\nSet API_KEY or GEMINI_API_KEY, or pass --api-key.")]
    ApiKeyMissing,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// A download was requested before any enhanced image exists.
    #[error("There is no enhanced image to save yet.")]
    NoResult,

    /// Could not write the enhanced image to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The cause of an [`EnhanceError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileRead,
    MissingImage,
    NoImageInResponse,
    InvalidCredential,
    RemoteFailure,
    InvalidParameter,
    ApiKeyMissing,
    InvalidConfig,
    NoResult,
    OutputWriteFailed,
    Internal,
}

impl EnhanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnhanceError::FileRead { .. } => ErrorKind::FileRead,
            EnhanceError::MissingImage => ErrorKind::MissingImage,
            EnhanceError::NoImageInResponse => ErrorKind::NoImageInResponse,
            EnhanceError::InvalidCredential => ErrorKind::InvalidCredential,
            EnhanceError::RemoteFailure { .. } => ErrorKind::RemoteFailure,
            EnhanceError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            EnhanceError::ApiKeyMissing => ErrorKind::ApiKeyMissing,
            EnhanceError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            EnhanceError::NoResult => ErrorKind::NoResult,
            EnhanceError::OutputWriteFailed { .. } => ErrorKind::OutputWriteFailed,
            EnhanceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Map the raw error text of a failed remote call to a typed error.
    ///
    /// A rejected credential gets the fixed [`EnhanceError::InvalidCredential`]
    /// message regardless of the rest of the upstream text; anything else is
    /// wrapped verbatim in [`EnhanceError::RemoteFailure`].
    pub fn from_upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(INVALID_CREDENTIAL_MARKER) {
            EnhanceError::InvalidCredential
        } else {
            EnhanceError::RemoteFailure { message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_messages_are_user_facing() {
        assert_eq!(
            EnhanceError::MissingImage.to_string(),
            "Please upload an image first."
        );
        assert_eq!(
            EnhanceError::NoImageInResponse.to_string(),
            "No image data found in the API response."
        );
        let e = EnhanceError::FileRead {
            path: "missing.png".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(e.to_string(), "Failed to read the image file.");
    }

    #[test]
    fn upstream_invalid_key_is_classified() {
        let e = EnhanceError::from_upstream(
            "[400 Bad Request] API key not valid. Please pass a valid API key.",
        );
        assert_eq!(e.kind(), ErrorKind::InvalidCredential);
        assert_eq!(
            e.to_string(),
            "The API key is invalid. Please check your configuration."
        );
    }

    #[test]
    fn upstream_other_error_is_prefixed() {
        let e = EnhanceError::from_upstream("quota exhausted");
        assert_eq!(e.kind(), ErrorKind::RemoteFailure);
        assert_eq!(e.to_string(), "Failed to process image. quota exhausted");
    }

    #[test]
    fn error_kind_serialises_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NoImageInResponse).unwrap();
        assert_eq!(json, "\"no_image_in_response\"");
    }
}
