//! Delimited-text and file parsing with delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::FetchError;
use crate::table::{Cell, Table};

use super::json;
use super::source::SourceMetadata;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the data has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses tabular files and uploaded bytes into a [`Table`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Table, SourceMetadata), FetchError> {
        let path = path.as_ref();
        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (table, format) = self.parse_named(&name, &contents)?;

        tracing::debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "parsed file"
        );

        let metadata = SourceMetadata::new(path.display().to_string(), format, &contents, &table);
        Ok((table, metadata))
    }

    /// Parse an in-memory file, choosing the format from its name.
    pub fn parse_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(Table, SourceMetadata), FetchError> {
        let (table, format) = self.parse_named(file_name, bytes)?;
        let metadata = SourceMetadata::new(file_name.to_string(), format, bytes, &table);
        Ok((table, metadata))
    }

    fn parse_named(&self, name: &str, bytes: &[u8]) -> Result<(Table, String), FetchError> {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok((json::table_from_slice(bytes)?, "json".to_string())),
            "xlsx" | "xls" | "xlsm" | "ods" => Err(FetchError::UnsupportedFormat(format!(
                "spreadsheet files ('.{}') must be exported to CSV first",
                extension
            ))),
            _ => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(bytes).ok_or_else(|| {
                        FetchError::EmptyData("No lines to analyze".to_string())
                    })?,
                };
                let table = self.parse_bytes(bytes, delimiter)?;
                Ok((table, format_name(delimiter).to_string()))
            }
        }
    }

    /// Parse delimited bytes directly.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Table, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            records.push(result?);
        }

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.trim().to_string()).collect()
        } else {
            // Generate column names
            match records.first() {
                Some(record) => (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect(),
                None => return Err(FetchError::EmptyData("No data rows found".to_string())),
            }
        };

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(FetchError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        let rows = records
            .iter()
            .map(|record| {
                let mut row: Vec<Cell> = record.iter().map(Cell::parse).collect();
                // Pad or truncate to the header width
                row.resize(expected_cols, Cell::Null);
                row
            })
            .collect();

        Ok(Table::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Detect the delimiter by analyzing the first few lines.
///
/// Returns `None` when there are no non-blank lines. Falls back to a comma
/// when no candidate delimiter appears.
pub fn detect_delimiter(bytes: &[u8]) -> Option<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return None;
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Higher count with lower variance wins; tab gets a small bonus as it
        // rarely appears inside values.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Some(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
