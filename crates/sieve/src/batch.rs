//! Splitting a table into fixed-size row batches.

use std::num::NonZeroUsize;
use std::slice::Chunks;

use crate::error::{PipelineError, Result};
use crate::table::{render_delimited, render_grid, Cell, Table};

/// Default number of rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// A contiguous, borrowed range of rows from a table.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    number: usize,
    total: usize,
    start: usize,
    headers: &'a [String],
    rows: &'a [Vec<Cell>],
}

impl<'a> Batch<'a> {
    /// 1-based position of this batch in the run.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Number of batches in the plan.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Index of the first row in the source table.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index one past the last row in the source table.
    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &'a [String] {
        self.headers
    }

    pub fn rows(&self) -> &'a [Vec<Cell>] {
        self.rows
    }

    /// Aligned dump of the rows, numbered by their position in the source table.
    pub fn display_grid(&self) -> String {
        render_grid(self.headers, self.rows, self.start)
    }

    /// The rows as CSV with a header line.
    pub fn to_csv(&self) -> csv::Result<String> {
        render_delimited(self.headers, self.rows, b',')
    }
}

/// Plans fixed-size batches over a table.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner {
    batch_size: NonZeroUsize,
}

impl BatchPlanner {
    /// Create a planner. `batch_size` must be positive.
    pub fn new(batch_size: usize) -> Result<Self> {
        NonZeroUsize::new(batch_size)
            .map(|batch_size| Self { batch_size })
            .ok_or_else(|| PipelineError::Config("batch size must be a positive integer".to_string()))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Number of batches a table with `rows` rows is split into.
    pub fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.batch_size.get())
    }

    /// Lazily split a table into batches, in row order.
    ///
    /// Every row appears in exactly one batch. Only the last batch may be
    /// shorter than the batch size, and a table with no rows yields no batches.
    pub fn plan<'a>(&self, table: &'a Table) -> Batches<'a> {
        Batches {
            headers: &table.headers,
            chunks: table.rows.chunks(self.batch_size.get()),
            batch_size: self.batch_size.get(),
            next_number: 1,
            total: self.batch_count(table.row_count()),
        }
    }
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Split a table into batches of `batch_size` rows.
pub fn plan(table: &Table, batch_size: usize) -> Result<Batches<'_>> {
    Ok(BatchPlanner::new(batch_size)?.plan(table))
}

/// Iterator over the batches of a table.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    headers: &'a [String],
    chunks: Chunks<'a, Vec<Cell>>,
    batch_size: usize,
    next_number: usize,
    total: usize,
}

impl<'a> Batches<'a> {
    /// Number of batches in the whole plan.
    pub fn total(&self) -> usize {
        self.total
    }

    fn batch(&self, number: usize, rows: &'a [Vec<Cell>]) -> Batch<'a> {
        Batch {
            number,
            total: self.total,
            start: (number - 1) * self.batch_size,
            headers: self.headers,
            rows,
        }
    }
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.chunks.next()?;
        let number = self.next_number;
        self.next_number += 1;
        Some(self.batch(number, rows))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let rows = self.chunks.nth(n)?;
        let number = self.next_number + n;
        self.next_number = number + 1;
        Some(self.batch(number, rows))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}
