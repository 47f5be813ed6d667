//! Error types for the Sieve library.
//!
//! Each stage of a cleaning run has its own error type so callers can tell
//! where a run stopped. [`PipelineError`] is what a pipeline run returns;
//! [`FetchError`] belongs to the source loaders and is surfaced before a run
//! is ever started.

use std::path::PathBuf;

use thiserror::Error;

/// Error produced while loading a table from a source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON payload could not be decoded or is not tabular.
    #[error("JSON error: {0}")]
    Json(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Database URL scheme not supported.
    #[error("Unsupported database URL: {0}")]
    UnsupportedDatabase(String),

    /// Error from the SQL engine.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP transport failure.
    #[error("HTTP request to '{url}' failed: {message}")]
    Http { url: String, message: String },

    /// Non-success HTTP status from an API source.
    #[error("API request to '{url}' failed with status {status}")]
    Status { url: String, status: u16 },

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),
}

/// The table handed to the rule cleaner is not rectangular.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Row {row} has {found} cells, expected {expected}")]
pub struct RuleError {
    /// Zero-based row index of the first ragged row.
    pub row: usize,
    /// Number of columns in the header.
    pub expected: usize,
    /// Number of cells found in the row.
    pub found: usize,
}

/// Failure of the text-generation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Provider is misconfigured (missing key, bad header value, ...).
    #[error("Provider configuration error: {0}")]
    Config(String),

    /// Transport failure or timeout.
    #[error("Request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status.
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider payload could not be decoded.
    #[error("Malformed provider response: {0}")]
    Response(String),

    /// Provider returned no completion text.
    #[error("Provider returned an empty completion")]
    EmptyResponse,

    /// The batch could not be rendered into a prompt.
    #[error("Could not render prompt: {0}")]
    Prompt(String),
}

/// Why the concatenated agent output could not be turned back into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyFailure {
    /// The header line does not match the expected column names.
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A data row has the wrong number of fields.
    RowWidth { expected: usize, found: usize },
    /// A numeric column received a non-numeric value.
    NotNumeric { column: String, value: String },
    /// The text is not parseable as delimited data.
    Malformed(String),
}

impl std::fmt::Display for AssemblyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblyFailure::HeaderMismatch { expected, found } => write!(
                f,
                "header [{}] does not match expected columns [{}]",
                found.join(", "),
                expected.join(", ")
            ),
            AssemblyFailure::RowWidth { expected, found } => {
                write!(f, "row has {} fields, expected {}", found, expected)
            }
            AssemblyFailure::NotNumeric { column, value } => {
                write!(f, "value '{}' in numeric column '{}' is not a number", value, column)
            }
            AssemblyFailure::Malformed(message) => write!(f, "malformed output: {}", message),
        }
    }
}

/// The assembled agent output could not be parsed.
///
/// The raw concatenated text is kept so it can be shown to a person.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Could not assemble cleaned table ({})", self.location())]
pub struct AssemblyError {
    /// What went wrong.
    pub failure: AssemblyFailure,
    /// 1-based batch whose output triggered the failure, if known.
    pub batch: Option<usize>,
    /// 1-based line of the joined text, if known.
    pub line: Option<usize>,
    /// The joined agent output.
    pub raw_text: String,
}

impl AssemblyError {
    fn location(&self) -> String {
        match (self.batch, self.line) {
            (Some(batch), Some(line)) => {
                format!("batch {}, line {}: {}", batch, line, self.failure)
            }
            (None, Some(line)) => format!("line {}: {}", line, self.failure),
            _ => self.failure.to_string(),
        }
    }
}

/// Error returned by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input table is malformed.
    #[error("Rule-based cleaning failed: {0}")]
    Rule(#[from] RuleError),

    /// A batch's generation call failed; the run was aborted.
    #[error("Generation failed on batch {batch} of {total} after {attempts} attempt(s): {source}")]
    Generation {
        /// 1-based batch number.
        batch: usize,
        /// Number of batches planned for the run.
        total: usize,
        /// Number of calls made for this batch.
        attempts: u32,
        #[source]
        source: GenerationError,
    },

    /// The agent output could not be assembled.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl PipelineError {
    /// The raw model output, when the failure happened during assembly.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PipelineError::Assembly(e) => Some(&e.raw_text),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_mentions_batch() {
        let err = PipelineError::Generation {
            batch: 2,
            total: 3,
            attempts: 1,
            source: GenerationError::Request("timed out".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("batch 2 of 3"));
        assert!(message.contains("timed out"));
        assert!(err.raw_output().is_none());
    }

    #[test]
    fn test_assembly_error_keeps_raw_text() {
        let err = PipelineError::from(AssemblyError {
            failure: AssemblyFailure::RowWidth {
                expected: 2,
                found: 3,
            },
            batch: Some(1),
            line: Some(4),
            raw_text: "a,b\n1,2,3".to_string(),
        });
        assert_eq!(err.raw_output(), Some("a,b\n1,2,3"));
        assert!(err.to_string().contains("batch 1, line 4"));
    }
}
