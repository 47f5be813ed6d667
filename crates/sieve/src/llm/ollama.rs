//! Ollama local LLM provider implementation.
//!
//! Ollama allows running LLMs locally without API keys.
//! Install from: https://ollama.ai

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::error::GenerationError;

use super::prompts;
use super::provider::{check_status, http_client, non_empty, LlmConfig, TextGenerator};

/// Default Ollama API endpoint.
const DEFAULT_API_URL: &str = "http://localhost:11434/api/chat";

/// Default local model.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    api_url: String,
    config: LlmConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// Uses llama3.2 model by default. Make sure you've pulled it:
    /// `ollama pull llama3.2`
    pub fn new() -> Result<Self, GenerationError> {
        Self::with_model(DEFAULT_MODEL)
    }

    /// Create with a specific model.
    pub fn with_model(model: impl Into<String>) -> Result<Self, GenerationError> {
        // Local models can be slower
        Self::with_config(LlmConfig::for_model(model).with_timeout_secs(120))
    }

    /// Create with custom configuration. `OLLAMA_HOST` overrides the server.
    pub fn with_config(config: LlmConfig) -> Result<Self, GenerationError> {
        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| format!("{}/api/chat", host.trim_end_matches('/')))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client: http_client(&config)?,
            api_url,
            config,
        })
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

impl TextGenerator for OllamaProvider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
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
            .post(&self.api_url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Request(
                        "Failed to connect to Ollama. Is it running? Start with: ollama serve"
                            .to_string(),
                    )
                } else {
                    GenerationError::Request(format!("Ollama request failed: {}", e))
                }
            })?;

        let response = match check_status(response) {
            Err(GenerationError::Status { body, .. }) if body.contains("not found") => {
                return Err(GenerationError::Config(format!(
                    "Model '{}' not found. Pull it with: ollama pull {}",
                    self.config.model, self.config.model
                )));
            }
            other => other?,
        };

        let api_response: OllamaResponse = response
            .json()
            .map_err(|e| GenerationError::Response(e.to_string()))?;

        non_empty(Some(api_response.message.content))
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let provider = OllamaProvider::with_model("mistral").unwrap();
        assert_eq!(provider.config().model, "mistral");
        assert_eq!(provider.config().timeout_secs, 120);
        assert_eq!(provider.name(), "Ollama");
    }
}
