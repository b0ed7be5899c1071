//! LLM client abstraction and provider selection
//!
//! The research pipeline only ever needs a single-turn completion, optionally
//! with a system prompt and an attached image. Providers implement
//! [`LLMClient::complete`]; the convenience methods build an [`LlmRequest`].

use std::time::Duration;

use crate::types::{AppError, Result};
use crate::utils::toml_config::{LlmConfig, ProviderConfig};
use async_trait::async_trait;
use base64::prelude::*;

/// An image attached to a prompt, already base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// MIME type, e.g. `image/png`
    pub media_type: String,
    /// Standard base64 without a data-URL prefix
    pub data_base64: String,
}

impl ImageInput {
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            data_base64: BASE64_STANDARD.encode(bytes),
        }
    }

    /// `data:<media_type>;base64,<data>` form used by OpenAI-compatible APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data_base64)
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LlmRequest<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub image: Option<&'a ImageInput>,
    pub max_tokens: Option<u32>,
}

impl<'a> LlmRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            ..Default::default()
        }
    }

    pub fn system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn image(mut self, image: Option<&'a ImageInput>) -> Self {
        self.image = image;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run a completion and return the assistant text
    async fn complete(&self, request: &LlmRequest<'_>) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
///
/// | Provider | Images | Notes |
/// |----------|--------|-------|
/// | OpenAI | `image_url` data URLs | Any OpenAI-compatible endpoint |
/// | Ollama | `images` array | Needs a vision model (e.g. `llava`) for images |
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolve a provider from configuration, reading the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match &config.provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "environment variable '{}' is not set",
                        api_key_env
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                })
            }
            ProviderConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
        }
    }

    /// Create a client instance for this provider
    pub fn create_client(&self, timeout: Duration) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                timeout,
            )?)),
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone(), timeout)?,
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

/// Shared `reqwest` client construction for provider clients.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}
