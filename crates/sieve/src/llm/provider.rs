//! Text-generation trait and shared provider plumbing.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Configuration shared by all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier passed to the backend.
    pub model: String,

    /// Maximum tokens in a completion.
    pub max_tokens: u32,

    /// Sampling temperature. Cleaning wants reproducible output, so this
    /// defaults to 0.
    pub temperature: f32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Config with a different model and otherwise default settings.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// A text-completion backend.
///
/// The cleaning agent depends on nothing else: one prompt in, one completion
/// out. Implementations own their own timeout policy.
pub trait TextGenerator: Send + Sync {
    /// Complete a prompt.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the configuration.
    fn config(&self) -> &LlmConfig;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn config(&self) -> &LlmConfig {
        (**self).config()
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn config(&self) -> &LlmConfig {
        (**self).config()
    }
}

/// Build a blocking client with the configured timeout.
pub(super) fn http_client(config: &LlmConfig) -> Result<Client, GenerationError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| GenerationError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into [`GenerationError::Status`].
pub(super) fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(GenerationError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Reject completions that carry no text.
pub(super) fn non_empty(text: Option<String>) -> Result<String, GenerationError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::EmptyResponse),
    }
}
