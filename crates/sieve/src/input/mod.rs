//! Table sources: files, uploads, SQL queries and HTTP APIs.

mod api;
mod context;
mod database;
mod json;
mod parser;
mod source;

pub use context::ContextHints;
pub use database::DatabaseConnection;
pub use json::{table_from_slice, table_from_value};
pub use parser::{detect_delimiter, Parser, ParserConfig};
pub use source::{fetch_table, Source, SourceMetadata};
