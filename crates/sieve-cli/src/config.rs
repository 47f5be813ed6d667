//! TOML configuration file and flag resolution.
//!
//! Values come from three layers: built-in defaults, an optional
//! `sieve.toml`, then command-line flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sieve::{
    AnthropicProvider, ContextHints, GenerationError, LlmConfig, MockProvider, OllamaProvider,
    OpenAIProvider, PipelineConfig, TextGenerator,
};

use crate::cli::{LlmProviderChoice, OutputFormat, PipelineArgs};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "sieve.toml";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
    pub context: ContextHints,
    pub server: ServerSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Option<LlmProviderChoice>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub batch_size: Option<usize>,
    pub max_retries: Option<u32>,
    pub max_rows: Option<usize>,
    pub max_text_len: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| format!("Invalid config '{}': {}", path.display(), e).into())
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the explicit config file, else `./sieve.toml` if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Merge flags over file values.
    pub fn resolve(&self, args: &PipelineArgs) -> Settings {
        let provider = args.llm.or(self.llm.provider).unwrap_or_default();

        let mut llm = LlmConfig::for_model(
            args.model
                .clone()
                .or_else(|| self.llm.model.clone())
                .unwrap_or_else(|| default_model(provider).to_string()),
        );
        if let Some(max_tokens) = self.llm.max_tokens {
            llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.llm.temperature {
            llm.temperature = temperature;
        }
        if let Some(secs) = self.llm.timeout_secs {
            llm = llm.with_timeout_secs(secs);
        }

        let defaults = PipelineConfig::default();
        let mut context = self.context.clone();
        if let Some(domain) = &args.domain {
            context = context.with_domain(domain);
        }

        let pipeline = PipelineConfig {
            batch_size: args
                .batch_size
                .or(self.pipeline.batch_size)
                .unwrap_or(defaults.batch_size),
            max_retries: args
                .max_retries
                .or(self.pipeline.max_retries)
                .unwrap_or(defaults.max_retries),
            max_rows: args.max_rows.or(self.pipeline.max_rows),
            max_text_len: args.max_text_len.or(self.pipeline.max_text_len),
            context,
        };

        Settings {
            provider,
            llm,
            pipeline,
        }
    }

    pub fn host(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self, flag: Option<u16>) -> u16 {
        flag.or(self.server.port).unwrap_or(DEFAULT_PORT)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: LlmProviderChoice,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Build the configured text generator.
    pub fn build_generator(&self) -> Result<Arc<dyn TextGenerator>, GenerationError> {
        let config = self.llm.clone();
        let generator: Arc<dyn TextGenerator> = match self.provider {
            LlmProviderChoice::OpenAI => Arc::new(OpenAIProvider::from_env(config)?),
            LlmProviderChoice::Anthropic => Arc::new(AnthropicProvider::from_env(config)?),
            LlmProviderChoice::Ollama => Arc::new(OllamaProvider::with_config(config)?),
            LlmProviderChoice::Mock => Arc::new(MockProvider::with_config(config)),
        };
        tracing::debug!(
            provider = generator.name(),
            model = %generator.config().model,
            "text generator ready"
        );
        Ok(generator)
    }
}

fn default_model(provider: LlmProviderChoice) -> &'static str {
    match provider {
        LlmProviderChoice::OpenAI => "gpt-4o",
        LlmProviderChoice::Anthropic => "claude-sonnet-4-20250514",
        LlmProviderChoice::Ollama => "llama3.2",
        LlmProviderChoice::Mock => "mock",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[llm]
provider = "ollama"
model = "mistral"
timeout_secs = 300

[pipeline]
batch_size = 50
max_rows = 1000

[context]
dataset_name = "orders"
domain = "retail"

[context.column_hints]
amount = "order total in EUR"

[server]
port = 9000
"#;

    #[test]
    fn test_parse_file_config() {
        let config = FileConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.llm.provider, Some(LlmProviderChoice::Ollama));
        assert_eq!(config.pipeline.batch_size, Some(50));
        assert_eq!(config.context.domain.as_deref(), Some("retail"));
        assert_eq!(config.context.column_hints["amount"], "order total in EUR");
        assert_eq!(config.port(None), 9000);
        assert_eq!(config.host(None), DEFAULT_HOST);
    }

    #[test]
    fn test_flags_override_file() {
        let config = FileConfig::from_toml(SAMPLE).unwrap();
        let args = PipelineArgs {
            llm: Some(LlmProviderChoice::Mock),
            batch_size: Some(5),
            domain: Some("finance".to_string()),
            ..PipelineArgs::default()
        };

        let settings = config.resolve(&args);

        assert_eq!(settings.provider, LlmProviderChoice::Mock);
        assert_eq!(settings.llm.model, "mistral");
        assert_eq!(settings.llm.timeout_secs, 300);
        assert_eq!(settings.pipeline.batch_size, 5);
        assert_eq!(settings.pipeline.max_rows, Some(1000));
        assert_eq!(settings.pipeline.context.domain.as_deref(), Some("finance"));
        assert_eq!(settings.pipeline.context.dataset_name.as_deref(), Some("orders"));
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = FileConfig::default().resolve(&PipelineArgs::default());
        assert_eq!(settings.provider, LlmProviderChoice::OpenAI);
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.pipeline.batch_size, 20);
        assert_eq!(settings.pipeline.max_retries, 0);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(FileConfig::from_toml("[llm]\nprovider = \"bard\"\n").is_err());
    }

    #[test]
    fn test_build_mock_generator() {
        let args = PipelineArgs {
            llm: Some(LlmProviderChoice::Mock),
            ..PipelineArgs::default()
        };
        let generator = FileConfig::default().resolve(&args).build_generator().unwrap();
        assert_eq!(generator.config().model, "mock");
    }
}
