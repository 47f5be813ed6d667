//! Mock LLM provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::GenerationError;

use super::prompts;
use super::provider::{LlmConfig, TextGenerator};

/// Mock provider that returns predictable responses.
///
/// By default it answers with the CSV block embedded in the cleaning prompt,
/// so a run round-trips each batch unchanged. A scripted mock replays queued
/// responses in order and falls back to echoing once the script runs out.
pub struct MockProvider {
    config: LlmConfig,
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create an echoing mock provider.
    pub fn new() -> Self {
        Self::with_config(LlmConfig::for_model("mock"))
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Self {
        Self {
            config,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that replays `responses`, one per call.
    pub fn scripted(responses: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        let mock = Self::new();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(responses);
        }
        mock
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator for MockProvider {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.script.lock().ok().and_then(|mut script| script.pop_front());
        if let Some(response) = scripted {
            return response;
        }

        prompts::embedded_csv(prompt)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Response("prompt has no CSV block to echo".to_string()))
    }

    fn name(&self) -> &str {
        "Mock"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}
