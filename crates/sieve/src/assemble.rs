//! Stitching per-batch agent responses back into one table.

use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AssemblyError, AssemblyFailure};
use crate::input::detect_delimiter;
use crate::table::{Cell, ColumnKind, Schema, Table};

// =============================================================================
// RESPONSE NORMALIZATION
// =============================================================================
// Models like to wrap CSV in Markdown fences, sometimes with prose around it.

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid fence pattern"));

/// Strip a surrounding Markdown code fence and trim the text.
///
/// When the response holds a fenced block, only the first block's body is
/// kept. Otherwise the whole response is used.
pub fn strip_code_fences(response: &str) -> &str {
    CODE_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map_or(response, |body| body.as_str())
        .trim()
}

// =============================================================================
// ASSEMBLY
// =============================================================================

/// Rebuilds a table from agent responses against an expected schema.
///
/// Responses are joined with newlines in batch order and parsed as delimited
/// text. The first line must be the header; a header line at the start of a
/// later batch is skipped. Every batch must contribute at least one row.
/// Rows are never reordered or deduplicated.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    schema: Schema,
}

impl ResultAssembler {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Parse the ordered responses into a table.
    pub fn assemble<S: AsRef<str>>(&self, responses: &[S]) -> Result<Table, AssemblyError> {
        let headers: Vec<String> = self
            .schema
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if responses.is_empty() {
            return Ok(Table::empty(headers));
        }

        let bodies: Vec<&str> = responses
            .iter()
            .map(|r| strip_code_fences(r.as_ref()))
            .collect();
        let joined = bodies.join("\n");
        let lines = LineIndex::new(&bodies);

        let fail = |failure: AssemblyFailure, line: Option<usize>| {
            let error = AssemblyError {
                failure,
                batch: line.map(|l| lines.batch_of(l)),
                line,
                raw_text: joined.clone(),
            };
            tracing::warn!(error = %error, "assembly failed");
            error
        };

        let delimiter = if headers.len() > 1 {
            detect_delimiter(joined.as_bytes()).unwrap_or(b',')
        } else {
            b','
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(joined.as_bytes());

        let mut rows = Vec::new();
        let mut rows_per_batch = vec![0usize; bodies.len()];
        let mut header_seen = false;
        let mut last_batch = 0;

        for result in reader.records() {
            let record = result.map_err(|e| {
                let line = e.position().map(|p| p.line() as usize);
                fail(AssemblyFailure::Malformed(e.to_string()), line)
            })?;
            let line = record.position().map(|p| p.line() as usize);
            let batch = line.map_or(last_batch, |l| lines.batch_of(l));
            let first_of_batch = batch != last_batch;
            last_batch = batch;

            if !header_seen {
                if !self.is_header(&record) {
                    return Err(fail(
                        AssemblyFailure::HeaderMismatch {
                            expected: headers.clone(),
                            found: record.iter().map(str::to_string).collect(),
                        },
                        line,
                    ));
                }
                header_seen = true;
                continue;
            }
            if first_of_batch && self.is_header(&record) {
                continue;
            }

            rows.push(self.parse_row(&record).map_err(|failure| fail(failure, line))?);
            if let Some(count) = rows_per_batch.get_mut(batch.saturating_sub(1)) {
                *count += 1;
            }
        }

        if !header_seen {
            return Err(fail(
                AssemblyFailure::Malformed("no header line in output".to_string()),
                None,
            ));
        }
        if let Some(empty) = rows_per_batch.iter().position(|&count| count == 0) {
            let batch = empty + 1;
            return Err(fail(
                AssemblyFailure::Malformed(format!("batch {} returned no rows", batch)),
                Some(lines.start_of(batch)),
            ));
        }

        tracing::debug!(rows = rows.len(), batches = bodies.len(), "assembled cleaned table");
        Ok(Table::new(headers, rows))
    }

    fn is_header(&self, record: &StringRecord) -> bool {
        record.len() == self.schema.column_count()
            && record
                .iter()
                .zip(&self.schema.columns)
                .all(|(field, column)| field == column.name)
    }

    fn parse_row(&self, record: &StringRecord) -> Result<Vec<Cell>, AssemblyFailure> {
        if record.len() != self.schema.column_count() {
            return Err(AssemblyFailure::RowWidth {
                expected: self.schema.column_count(),
                found: record.len(),
            });
        }

        record
            .iter()
            .zip(&self.schema.columns)
            .map(|(field, column)| match column.kind {
                ColumnKind::Numeric => match Cell::parse(field) {
                    Cell::Text(_) => Err(AssemblyFailure::NotNumeric {
                        column: column.name.clone(),
                        value: field.to_string(),
                    }),
                    cell => Ok(cell),
                },
                // Text columns keep values like "02134" or "None" verbatim.
                ColumnKind::Text if field.is_empty() => Ok(Cell::Null),
                ColumnKind::Text => Ok(Cell::Text(field.to_string())),
                ColumnKind::Mixed => Ok(Cell::parse(field)),
            })
            .collect()
    }
}

/// Maps lines of the joined text back to the batch they came from.
struct LineIndex {
    /// 1-based first line of each batch.
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(bodies: &[&str]) -> Self {
        let mut starts = Vec::with_capacity(bodies.len());
        let mut next = 1;
        for body in bodies {
            starts.push(next);
            next += body.split('\n').count();
        }
        Self { starts }
    }

    /// 1-based batch number of a 1-based line.
    fn batch_of(&self, line: usize) -> usize {
        self.starts.partition_point(|&start| start <= line).max(1)
    }

    /// 1-based first line of a 1-based batch.
    fn start_of(&self, batch: usize) -> usize {
        self.starts.get(batch.saturating_sub(1)).copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnSpec;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("name", ColumnKind::Text),
            ColumnSpec::new("age", ColumnKind::Numeric),
        ])
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```csv\na,b\n1,2\n```"), "a,b\n1,2");
        assert_eq!(
            strip_code_fences("Here you go:\n```\na\n1\n```\nDone."),
            "a\n1"
        );
        assert_eq!(strip_code_fences("  a,b\n1,2 \n"), "a,b\n1,2");
    }

    #[test]
    fn test_batches_joined_in_order() {
        let assembler = ResultAssembler::new(schema());
        let table = assembler
            .assemble(&["name,age\nAnn,31\nBo,40", "name,age\nCy,22", "Di,"])
            .unwrap();

        assert_eq!(table.headers, vec!["name", "age"]);
        let names: Vec<_> = table.column_values(0).filter_map(Cell::as_text).collect();
        assert_eq!(names, vec!["Ann", "Bo", "Cy", "Di"]);
        assert_eq!(table.rows[3][1], Cell::Null);
    }

    #[test]
    fn test_fenced_responses() {
        let assembler = ResultAssembler::new(schema());
        let table = assembler
            .assemble(&["```csv\nname,age\nAnn,31\n```", "```\nBo,40\n```"])
            .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1][1], Cell::Number(40.0));
    }

    #[test]
    fn test_semicolon_output() {
        let assembler = ResultAssembler::new(schema());
        let table = assembler.assemble(&["name;age\nAnn;31\nBo;40"]).unwrap();
        assert_eq!(table.rows[0], vec![Cell::text("Ann"), Cell::Number(31.0)]);
    }

    #[test]
    fn test_zero_responses_gives_empty_table() {
        let assembler = ResultAssembler::new(schema());
        let table = assembler.assemble::<&str>(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_header_mismatch_keeps_raw_text() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler
            .assemble(&["The data looks clean to me."])
            .unwrap_err();
        assert!(matches!(err.failure, AssemblyFailure::HeaderMismatch { .. }));
        assert_eq!(err.batch, Some(1));
        assert_eq!(err.raw_text, "The data looks clean to me.");
    }

    #[test]
    fn test_row_width_reports_batch_and_line() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler
            .assemble(&["name,age\nAnn,31", "name,age\nBo,40,extra"])
            .unwrap_err();
        assert_eq!(
            err.failure,
            AssemblyFailure::RowWidth { expected: 2, found: 3 }
        );
        assert_eq!(err.batch, Some(2));
        assert_eq!(err.line, Some(4));
        assert_eq!(err.raw_text, "name,age\nAnn,31\nname,age\nBo,40,extra");
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler
            .assemble(&["name,age\nAnn,thirty"])
            .unwrap_err();
        assert_eq!(
            err.failure,
            AssemblyFailure::NotNumeric {
                column: "age".to_string(),
                value: "thirty".to_string()
            }
        );
    }

    #[test]
    fn test_empty_output_is_malformed() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler.assemble(&["", "  "]).unwrap_err();
        assert!(matches!(err.failure, AssemblyFailure::Malformed(_)));
    }

    #[test]
    fn test_batch_without_rows_is_rejected() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler
            .assemble(&["name,age\nAnn,31", "```csv\n```", "Bo,40"])
            .unwrap_err();
        assert_eq!(
            err.failure,
            AssemblyFailure::Malformed("batch 2 returned no rows".to_string())
        );
        assert_eq!(err.batch, Some(2));
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_batch_with_only_header_is_rejected() {
        let assembler = ResultAssembler::new(schema());
        let err = assembler
            .assemble(&["name,age\nAnn,31", "name,age"])
            .unwrap_err();
        assert_eq!(err.batch, Some(2));
    }

    #[test]
    fn test_text_column_keeps_values_verbatim() {
        let schema = Schema::new(vec![
            ColumnSpec::new("zip", ColumnKind::Text),
            ColumnSpec::new("code", ColumnKind::Mixed),
        ]);
        let table = ResultAssembler::new(schema)
            .assemble(&["zip,code\n02134,7\nNone,x7\n,NA"])
            .unwrap();
        assert_eq!(table.rows[0], vec![Cell::text("02134"), Cell::Number(7.0)]);
        assert_eq!(table.rows[1], vec![Cell::text("None"), Cell::text("x7")]);
        assert_eq!(table.rows[2], vec![Cell::Null, Cell::Null]);
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new(&["a\nb", "c", "d\ne\nf"]);
        assert_eq!(index.batch_of(1), 1);
        assert_eq!(index.batch_of(2), 1);
        assert_eq!(index.batch_of(3), 2);
        assert_eq!(index.batch_of(6), 3);
        assert_eq!(index.start_of(2), 3);
        assert_eq!(index.start_of(3), 4);
    }
}
