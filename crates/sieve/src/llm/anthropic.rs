//! Anthropic Claude API provider implementation.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::error::GenerationError;

use super::prompts;
use super::provider::{check_status, http_client, non_empty, LlmConfig, TextGenerator};

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_url: String,
    config: LlmConfig,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_config(api_key, LlmConfig::default())
    }

    /// Create a new Anthropic provider with custom configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        config: LlmConfig,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            api_url: API_URL.to_string(),
            config,
        })
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env(config: LlmConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            GenerationError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::with_config(api_key, config)
    }

    /// Send requests to a different messages endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| GenerationError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

impl TextGenerator for AnthropicProvider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(&self.api_url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let api_response: ApiResponse = check_status(response)?
            .json()
            .map_err(|e| GenerationError::Response(e.to_string()))?;

        // Concatenate text blocks; tool-use and other block kinds are ignored.
        let text: String = api_response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();
        non_empty(Some(text))
    }

    fn name(&self) -> &str {
        "Anthropic"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}
