//! OpenAI chat completions provider.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::error::GenerationError;

use super::prompts;
use super::provider::{check_status, http_client, non_empty, LlmConfig, TextGenerator};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI GPT provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_config(api_key, LlmConfig::for_model(DEFAULT_MODEL))
    }

    /// Create a new OpenAI provider with custom configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        config: LlmConfig,
    ) -> Result<Self, GenerationError> {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            base_url,
            config,
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: LlmConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            GenerationError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_config(api_key, config)
    }

    /// Point the provider at a different API base (proxies, compatible servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| GenerationError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl TextGenerator for OpenAIProvider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {
                    "role": "system",
                    "content": prompts::system_prompt()
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let api_response: OpenAIResponse = check_status(response)?
            .json()
            .map_err(|e| GenerationError::Response(e.to_string()))?;

        non_empty(
            api_response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
        )
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}
