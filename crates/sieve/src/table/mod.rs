//! In-memory tabular data.

mod cell;
mod render;
mod schema;

use indexmap::IndexMap;

use crate::error::RuleError;

pub use cell::{Cell, CellKey};
pub use render::{render_delimited, render_grid};
pub use schema::{ColumnKind, ColumnSpec, Schema};

/// Represents tabular data as named columns over ordered rows.
///
/// Rows are stored row-major. Row order is meaningful and is preserved by
/// every stage of a cleaning run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Cell>>,
}

/// One row keyed by column name, in column order.
pub type Record = IndexMap<String, Cell>;

impl Table {
    /// Create a new table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Create a table with headers and no rows.
    pub fn empty(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string rows, parsing each value with [`Cell::parse`].
    pub fn from_strings(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|v| Cell::parse(v)).collect())
            .collect();
        Self { headers, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&Cell::Null))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Verify every row has exactly one cell per header.
    pub fn check_shape(&self) -> Result<(), RuleError> {
        let expected = self.headers.len();
        match self.rows.iter().position(|r| r.len() != expected) {
            Some(row) => Err(RuleError {
                row,
                expected,
                found: self.rows[row].len(),
            }),
            None => Ok(()),
        }
    }

    /// Kind of a column: numeric when all non-null values are numbers and at
    /// least one value is present, mixed when numbers and text both occur.
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        let (mut numbers, mut texts) = (false, false);
        for cell in self.column_values(index) {
            match cell {
                Cell::Null => {}
                Cell::Number(_) => numbers = true,
                Cell::Text(_) => texts = true,
            }
        }
        match (numbers, texts) {
            (true, false) => ColumnKind::Numeric,
            (true, true) => ColumnKind::Mixed,
            _ => ColumnKind::Text,
        }
    }

    /// Capture the column contract of this table.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.headers
                .iter()
                .enumerate()
                .map(|(i, name)| ColumnSpec {
                    name: name.clone(),
                    kind: self.column_kind(i),
                })
                .collect(),
        )
    }

    /// Keep only the first `n` rows.
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Clip text cells longer than `max_chars` characters, appending `...`.
    ///
    /// Returns the number of cells clipped.
    pub fn truncate_text(&mut self, max_chars: usize) -> usize {
        let mut clipped = 0;
        for cell in self.rows.iter_mut().flatten() {
            if let Cell::Text(s) = cell {
                if s.chars().count() > max_chars {
                    let mut short: String = s.chars().take(max_chars).collect();
                    short.push_str("...");
                    *s = short;
                    clipped += 1;
                }
            }
        }
        clipped
    }

    /// Render as delimited text with a header row.
    pub fn to_delimited(&self, delimiter: u8) -> csv::Result<String> {
        render_delimited(&self.headers, &self.rows, delimiter)
    }

    /// Render as an aligned, human-readable grid.
    pub fn display_grid(&self) -> String {
        render_grid(&self.headers, &self.rows, 0)
    }

    /// Convert to row records keyed by column name.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
