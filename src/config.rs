//! Configuration for the remote enhancement client and the workflow.
//!
//! All knobs live in [`EnhanceConfig`], built via [`EnhanceConfigBuilder`] or
//! read from the environment with [`EnhanceConfig::from_env`]. The one
//! required value is the API key; without it [`resolve_enhancer`] refuses to
//! build a client instead of letting every request fail at the remote end.

use crate::error::EnhanceError;
use crate::output::DEFAULT_RESULT_SUFFIX;
use crate::pipeline::remote::{GeminiClient, ImageEnhancer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Gemini REST root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables searched for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Configuration for an enhancement session.
///
/// # Example
/// ```rust
/// use aethercanvas::EnhanceConfig;
///
/// let config = EnhanceConfig::builder()
///     .api_key("test-key")
///     .model("gemini-2.5-flash-image")
///     .build()
///     .unwrap();
/// assert_eq!(config.result_suffix, "aethercanvas");
/// ```
#[derive(Clone)]
pub struct EnhanceConfig {
    /// Gemini API key. `None` until resolved from the builder or environment.
    pub api_key: Option<String>,

    /// Model identifier. Default: `gemini-2.5-flash-image`.
    pub model: String,

    /// REST root the model path is appended to. Default: the public Gemini endpoint.
    pub base_url: String,

    /// Suffix inserted before the extension of downloaded results. Default: `aethercanvas`.
    pub result_suffix: String,

    /// Pre-constructed enhancer. Takes precedence over `api_key`/`model`.
    pub enhancer: Option<Arc<dyn ImageEnhancer>>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            result_suffix: DEFAULT_RESULT_SUFFIX.to_string(),
            enhancer: None,
        }
    }
}

impl fmt::Debug for EnhanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhanceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("result_suffix", &self.result_suffix)
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl EnhanceConfig {
    pub fn builder() -> EnhanceConfigBuilder {
        EnhanceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus the first non-empty key found in [`API_KEY_ENV_VARS`].
    pub fn from_env() -> Self {
        let api_key = API_KEY_ENV_VARS.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .inspect(|_| debug!("Using API key from {}", var))
        });
        if api_key.is_none() {
            warn!(
                "No API key found in {}; remote calls are disabled until one is set",
                API_KEY_ENV_VARS.join(" or ")
            );
        }
        Self {
            api_key,
            ..Self::default()
        }
    }

    /// Whether a remote call could be attempted with this config.
    pub fn is_configured(&self) -> bool {
        self.enhancer.is_some()
            || self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }
}

/// Builder for [`EnhanceConfig`].
#[derive(Debug)]
pub struct EnhanceConfigBuilder {
    config: EnhanceConfig,
}

impl EnhanceConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn result_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.result_suffix = suffix.into();
        self
    }

    pub fn enhancer(mut self, enhancer: Arc<dyn ImageEnhancer>) -> Self {
        self.config.enhancer = Some(enhancer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EnhanceConfig, EnhanceError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(EnhanceError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(EnhanceError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.result_suffix.contains(|ch: char| ch == '/' || ch == '\\') {
            return Err(EnhanceError::InvalidConfig(
                "result suffix must not contain path separators".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Pick the enhancer for a config: an injected one, else a Gemini client.
///
/// Fails with [`EnhanceError::ApiKeyMissing`] when neither is available.
pub fn resolve_enhancer(config: &EnhanceConfig) -> Result<Arc<dyn ImageEnhancer>, EnhanceError> {
    if let Some(ref enhancer) = config.enhancer {
        return Ok(Arc::clone(enhancer));
    }
    let client = GeminiClient::from_config(config)?;
    Ok(Arc::new(client))
}
