//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Sieve: batched, LLM-assisted cleaning for tabular data
#[derive(Parser)]
#[command(name = "sieve")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to a TOML config file (default: ./sieve.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a CSV, TSV or JSON file
    Clean {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Clean the result of a SQL query
    Query {
        /// Database URL (e.g., sqlite://data.db)
        #[arg(long)]
        db: String,

        /// Query to run
        #[arg(long)]
        sql: String,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Clean JSON records fetched from an HTTP API
    Fetch {
        /// URL returning a JSON array of records
        #[arg(long)]
        url: String,

        /// Query parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the HTTP cleaning service
    Serve {
        /// Port for web server
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Pipeline options shared by every command.
///
/// Unset options fall back to the config file, then to built-in defaults.
#[derive(Args, Clone, Debug, Default)]
pub struct PipelineArgs {
    /// LLM provider (openai, anthropic, ollama, mock)
    #[arg(long)]
    pub llm: Option<LlmProviderChoice>,

    /// Model to use (provider-specific, e.g., "gpt-4o", "llama3.2")
    #[arg(long)]
    pub model: Option<String>,

    /// Rows per LLM call
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Extra attempts per batch after a failed LLM call
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Only clean the first N rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Clip text values to N characters before cleaning
    #[arg(long)]
    pub max_text_len: Option<usize>,

    /// Domain context for the model (e.g., "retail", "clinical")
    #[arg(short, long)]
    pub domain: Option<String>,
}

/// Where and how to write the cleaned table.
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Output path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output extension, else csv)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' in '{}'", s))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// LLM provider choice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderChoice {
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    #[default]
    OpenAI,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider that returns each batch unchanged
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: openai, anthropic, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_command() {
        let cli = Cli::try_parse_from([
            "sieve", "clean", "data.csv", "--llm", "mock", "--batch-size", "5", "-o", "out.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Clean {
                file,
                pipeline,
                output,
            } => {
                assert_eq!(file, PathBuf::from("data.csv"));
                assert_eq!(pipeline.llm, Some(LlmProviderChoice::Mock));
                assert_eq!(pipeline.batch_size, Some(5));
                assert_eq!(output.output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn test_fetch_params() {
        let cli = Cli::try_parse_from([
            "sieve", "fetch", "--url", "http://x/api", "--param", "limit=30",
        ])
        .unwrap();
        let Commands::Fetch { params, .. } = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(params, vec![("limit".to_string(), "30".to_string())]);
        assert!(parse_key_val("novalue").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(std::path::Path::new("out.TSV")),
            Some(OutputFormat::Tsv)
        );
        assert_eq!(OutputFormat::from_path(std::path::Path::new("out")), None);
    }
}
