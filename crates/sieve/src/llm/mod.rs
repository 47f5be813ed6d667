//! Text-generation providers used by the cleaning agent.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Ollama** - Local models, no API key needed (requires Ollama installed)
//! - **Mock** - Echoes each batch back, for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use sieve::{LlmConfig, OpenAIProvider, Pipeline};
//!
//! let provider = OpenAIProvider::from_env(LlmConfig::for_model("gpt-4o")).unwrap();
//! let pipeline = Pipeline::new(provider);
//! ```

mod anthropic;
mod mock;
mod ollama;
mod openai;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{LlmConfig, TextGenerator};
