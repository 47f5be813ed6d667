//! Deterministic, rule-based cleaning applied once before batching.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::RuleError;
use crate::table::{Cell, CellKey, ColumnKind, Table};

use super::operations::{ImputeStrategy, Imputation, RuleReport};

/// Rule-based cleaner.
///
/// A pass runs three steps in a fixed order:
///
/// 1. Text normalization: trim surrounding whitespace and collapse internal
///    runs of whitespace to one space. Case is preserved. Text that is empty
///    after trimming becomes null.
/// 2. Duplicate removal: fully duplicate rows are dropped, keeping the first
///    occurrence and the order of the remaining rows.
/// 3. Imputation: nulls in numeric columns get the column mean, nulls in
///    text columns get the column mode (ties go to the value seen first).
///    Columns with no values at all are left as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedCleaner;

impl RuleBasedCleaner {
    /// Create a new cleaner.
    pub fn new() -> Self {
        Self
    }

    /// Clean a table.
    ///
    /// A table with zero columns is returned unchanged. A table whose rows do
    /// not all match the header width is rejected with [`RuleError`].
    pub fn clean(&self, table: Table) -> Result<Table, RuleError> {
        self.clean_with_report(table).map(|(table, _)| table)
    }

    /// Clean a table and report what changed.
    pub fn clean_with_report(&self, mut table: Table) -> Result<(Table, RuleReport), RuleError> {
        let mut report = RuleReport::new();
        if table.column_count() == 0 {
            return Ok((table, report));
        }
        table.check_shape()?;

        report.cells_normalized = self.normalize_text(&mut table);
        report.duplicates_removed = self.drop_duplicates(&mut table);
        report.imputations = self.impute_missing(&mut table);

        tracing::debug!(
            normalized = report.cells_normalized,
            duplicates = report.duplicates_removed,
            imputed = report.cells_imputed(),
            rows = table.row_count(),
            "rule-based cleaning finished"
        );
        Ok((table, report))
    }

    /// Normalize whitespace in every text cell. Returns the number of cells changed.
    pub fn normalize_text(&self, table: &mut Table) -> usize {
        let mut changed = 0;
        for cell in table.rows.iter_mut().flatten() {
            let Cell::Text(text) = &mut *cell else { continue };
            let normalized = collapse_whitespace(text);
            if normalized.is_empty() {
                *cell = Cell::Null;
                changed += 1;
            } else if normalized != *text {
                *text = normalized;
                changed += 1;
            }
        }
        changed
    }

    /// Drop fully duplicate rows, keeping first occurrences. Returns the number removed.
    pub fn drop_duplicates(&self, table: &mut Table) -> usize {
        let before = table.rows.len();
        let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(before);
        table
            .rows
            .retain(|row| seen.insert(row.iter().map(Cell::key).collect()));
        before - table.rows.len()
    }

    /// Fill nulls column by column.
    pub fn impute_missing(&self, table: &mut Table) -> Vec<Imputation> {
        let mut imputations = Vec::new();

        for col in 0..table.column_count() {
            let missing = table.column_values(col).filter(|c| c.is_null()).count();
            if missing == 0 {
                continue;
            }

            let (strategy, fill) = match table.column_kind(col) {
                ColumnKind::Numeric => (ImputeStrategy::Mean, column_mean(table, col)),
                ColumnKind::Text | ColumnKind::Mixed => {
                    (ImputeStrategy::Mode, column_mode(table, col))
                }
            };
            let Some(value) = fill else { continue };

            for row in &mut table.rows {
                if row[col].is_null() {
                    row[col] = value.clone();
                }
            }

            imputations.push(Imputation {
                column: table.headers[col].clone(),
                strategy,
                value,
                cells_filled: missing,
            });
        }

        imputations
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn column_mean(table: &Table, col: usize) -> Option<Cell> {
    let (sum, count) = table
        .column_values(col)
        .filter_map(Cell::as_number)
        .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));
    (count > 0).then(|| Cell::number(sum / count as f64))
}

fn column_mode(table: &Table, col: usize) -> Option<Cell> {
    let mut counts: IndexMap<CellKey, (usize, &Cell)> = IndexMap::new();
    for cell in table.column_values(col).filter(|c| !c.is_null()) {
        counts.entry(cell.key()).or_insert((0, cell)).0 += 1;
    }

    let mut best: Option<(usize, &Cell)> = None;
    for &(count, cell) in counts.values() {
        if best.is_none_or(|(best_count, _)| count > best_count) {
            best = Some((count, cell));
        }
    }
    best.map(|(_, cell)| cell.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    #[test]
    fn test_duplicate_then_mean() {
        let input = table(
            &["a", "b"],
            vec![
                vec![Cell::Number(1.0), Cell::text("x")],
                vec![Cell::Null, Cell::text("x")],
                vec![Cell::Number(1.0), Cell::text("x")],
            ],
        );

        let (cleaned, report) = RuleBasedCleaner::new().clean_with_report(input).unwrap();

        assert_eq!(
            cleaned.rows,
            vec![
                vec![Cell::Number(1.0), Cell::text("x")],
                vec![Cell::Number(1.0), Cell::text("x")],
            ]
        );
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.cells_imputed(), 1);
        assert_eq!(report.imputations[0].strategy, ImputeStrategy::Mean);
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen() {
        let input = table(
            &["city"],
            vec![
                vec![Cell::text("LA")],
                vec![Cell::text("NYC")],
                vec![Cell::Null],
                vec![Cell::text("NYC")],
                vec![Cell::text("LA")],
                vec![Cell::text("SF")],
            ],
        );
        let cleaned = RuleBasedCleaner::new().clean(input).unwrap();
        assert_eq!(cleaned.rows[2][0], Cell::text("LA"));
    }

    #[test]
    fn test_mode_prefers_most_frequent() {
        let input = table(
            &["city", "n"],
            vec![
                vec![Cell::text("LA"), Cell::Number(1.0)],
                vec![Cell::text("NYC"), Cell::Number(2.0)],
                vec![Cell::text("NYC"), Cell::Number(3.0)],
                vec![Cell::Null, Cell::Number(4.0)],
            ],
        );
        let cleaned = RuleBasedCleaner::new().clean(input).unwrap();
        assert_eq!(cleaned.rows[3][0], Cell::text("NYC"));
    }

    #[test]
    fn test_mixed_column_uses_mode() {
        let input = table(
            &["code"],
            vec![
                vec![Cell::Number(7.0)],
                vec![Cell::text("seven")],
                vec![Cell::Null],
            ],
        );
        let (cleaned, report) = RuleBasedCleaner::new().clean_with_report(input).unwrap();
        assert_eq!(cleaned.rows[2][0], Cell::Number(7.0));
        assert_eq!(report.imputations[0].strategy, ImputeStrategy::Mode);
    }

    #[test]
    fn test_whitespace_normalized_case_preserved() {
        let input = table(
            &["name"],
            vec![
                vec![Cell::text("  Ada   Lovelace ")],
                vec![Cell::text("ada\tlovelace")],
                vec![Cell::text("   ")],
            ],
        );
        let (cleaned, report) = RuleBasedCleaner::new().clean_with_report(input).unwrap();
        assert_eq!(cleaned.rows[0][0], Cell::text("Ada Lovelace"));
        assert_eq!(cleaned.rows[1][0], Cell::text("ada lovelace"));
        // Blank text becomes null and is then imputed with the mode.
        assert_eq!(cleaned.rows[2][0], Cell::text("Ada Lovelace"));
        assert_eq!(report.cells_normalized, 3);
    }

    #[test]
    fn test_normalization_exposes_duplicates() {
        let input = table(
            &["name"],
            vec![vec![Cell::text("Bob ")], vec![Cell::text("Bob")]],
        );
        let cleaned = RuleBasedCleaner::new().clean(input).unwrap();
        assert_eq!(cleaned.row_count(), 1);
    }

    #[test]
    fn test_all_null_column_left_alone() {
        let input = table(&["empty"], vec![vec![Cell::Null], vec![Cell::Null]]);
        let (cleaned, report) = RuleBasedCleaner::new().clean_with_report(input).unwrap();
        // The two null rows are duplicates of each other.
        assert_eq!(cleaned.rows, vec![vec![Cell::Null]]);
        assert!(report.imputations.is_empty());
    }

    #[test]
    fn test_zero_columns_is_noop() {
        let input = Table::new(Vec::new(), vec![vec![], vec![]]);
        let (cleaned, report) = RuleBasedCleaner::new()
            .clean_with_report(input.clone())
            .unwrap();
        assert_eq!(cleaned, input);
        assert!(report.is_noop());
    }

    #[test]
    fn test_ragged_table_rejected() {
        let input = table(&["a", "b"], vec![vec![Cell::Number(1.0)]]);
        let err = RuleBasedCleaner::new().clean(input).unwrap_err();
        assert_eq!(err, RuleError { row: 0, expected: 2, found: 1 });
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let input = table(
            &["a", "b"],
            vec![
                vec![Cell::Number(2.0), Cell::text(" p ")],
                vec![Cell::Null, Cell::text("q")],
                vec![Cell::Number(4.0), Cell::Null],
            ],
        );
        let cleaner = RuleBasedCleaner::new();
        let once = cleaner.clean(input).unwrap();
        let (twice, report) = cleaner.clean_with_report(once.clone()).unwrap();
        assert_eq!(twice, once);
        assert!(report.is_noop());
    }
}
