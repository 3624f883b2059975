//! Remote enhancement: send one image plus instruction, get one image back.
//!
//! This is the only stage with network I/O: one
//! `generateContent` request per call, no retries, no client-side timeout
//! (reqwest's defaults apply), and no streaming. All prompt wording lives in
//! [`crate::prompts`].
//!
//! ## Request layout
//!
//! ```text
//! contents[0].parts = [ inlineData{mimeType, data}, text ]
//! generationConfig.responseModalities = ["IMAGE"]
//! ```
//!
//! ## Response handling
//!
//! Only the first candidate is inspected. Its parts are scanned in order and
//! the first one carrying non-empty `inlineData.data` is the result; any
//! later parts are ignored.

use crate::config::EnhanceConfig;
use crate::error::EnhanceError;
use crate::output::EnhancedImage;
use crate::pipeline::encode::{strip_data_uri_prefix, EncodedImage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Anything that can turn an image and an instruction into a new image.
///
/// The workflow holds an `Arc<dyn ImageEnhancer>`, so tests and alternative
/// backends can stand in for [`GeminiClient`]. Each call is a separate,
/// non-idempotent generation.
#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    async fn enhance(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EnhancedImage, EnhanceError>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "custom"
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Build the request body for one enhancement.
pub fn build_request(image: &EncodedImage, instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    inline_data: Some(InlineData {
                        mime_type: image.media_type.clone(),
                        data: image.payload.clone(),
                    }),
                    text: None,
                },
                Part {
                    inline_data: None,
                    text: Some(instruction.to_string()),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        },
    }
}

/// Pull the first inline image out of the first candidate.
pub fn extract_image(response: &GenerateContentResponse) -> Result<EnhancedImage, EnhanceError> {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .into_iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| {
            EnhancedImage::new(
                inline.mime_type.clone(),
                strip_data_uri_prefix(&inline.data),
            )
        })
        .ok_or(EnhanceError::NoImageInResponse)
}

/// Upstream error text for a non-success HTTP response.
///
/// Prefers the `error.message` field of Google's error envelope and falls
/// back to the raw body, then to the status line.
fn upstream_error_text(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.is_empty() {
            return format!("[{status}] {}", envelope.error.message);
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("[{status}]")
    } else {
        format!("[{status}] {body}")
    }
}

// ── Gemini client ────────────────────────────────────────────────────────

/// [`ImageEnhancer`] backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    /// Build a client from config, failing fast when no key is configured.
    pub fn from_config(config: &EnhanceConfig) -> Result<Self, EnhanceError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(EnhanceError::ApiKeyMissing)?;
        Ok(Self::new(key, &config.model, &config.base_url))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full URL of the `generateContent` call for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ImageEnhancer for GeminiClient {
    async fn enhance(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EnhancedImage, EnhanceError> {
        let start = Instant::now();
        let body = build_request(image, instruction);
        info!(
            "Submitting {} ({}, {} bytes base64) to {}",
            image.display_name,
            image.media_type,
            image.payload.len(),
            self.model
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", self.model, e);
                EnhanceError::from_upstream(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|e| {
                warn!("Could not read error body from {}: {}", self.model, e);
                String::new()
            });
            let message = upstream_error_text(status, &text);
            warn!("{} returned an error: {}", self.model, message);
            return Err(EnhanceError::from_upstream(message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EnhanceError::from_upstream(format!("invalid response body: {e}")))?;

        let result = extract_image(&parsed);
        match &result {
            Ok(img) => debug!(
                "{}: received {} ({} bytes base64) in {:?}",
                self.model,
                img.media_type,
                img.payload.len(),
                start.elapsed()
            ),
            Err(e) => warn!("{}: {}", self.model, e),
        }
        result
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
