//! Sieve: batched, LLM-assisted cleaning for tabular data.
//!
//! A table is loaded from a file, upload, SQL query or HTTP API, cleaned
//! once by deterministic rules, then sent to a language model in fixed-size
//! batches. The model's answers are parsed back into one table that keeps
//! the source row order.
//!
//! # Pipeline
//!
//! - **Rules**: whitespace normalization, duplicate removal, mean/mode imputation
//! - **Batches**: contiguous row ranges, 20 rows by default
//! - **Agent**: one generator call per batch, with optional bounded retries
//! - **Assembly**: responses joined in order and checked against the column contract
//!
//! # Example
//!
//! ```no_run
//! use sieve::{fetch_table, run_pipeline, MockProvider, Source};
//!
//! let (table, _meta) = fetch_table(Source::file("customers.csv")).unwrap();
//! let result = run_pipeline(table, MockProvider::new(), 20).unwrap();
//!
//! println!("Rows: {}", result.table.row_count());
//! println!("Duplicates removed: {}", result.report.duplicates_removed());
//! ```

pub mod agent;
pub mod assemble;
pub mod batch;
pub mod error;
pub mod input;
pub mod llm;
pub mod table;
pub mod transform;

mod pipeline;

pub use crate::pipeline::{
    run_pipeline, CleaningResult, Pipeline, PipelineConfig, PipelineRun, RunReport,
};
pub use agent::{AgentFailure, AgentState, CleaningAgent, CleaningState};
pub use assemble::ResultAssembler;
pub use batch::{Batch, BatchPlanner, Batches, DEFAULT_BATCH_SIZE};
pub use error::{
    AssemblyError, AssemblyFailure, FetchError, GenerationError, PipelineError, Result, RuleError,
};
pub use input::{fetch_table, ContextHints, DatabaseConnection, Parser, Source, SourceMetadata};
pub use llm::{AnthropicProvider, LlmConfig, MockProvider, OllamaProvider, OpenAIProvider, TextGenerator};
pub use table::{Cell, ColumnKind, ColumnSpec, Record, Schema, Table};
pub use transform::{RuleBasedCleaner, RuleReport};
