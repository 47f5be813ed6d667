//! Property-based tests for batching, assembly and the rule-based cleaner.
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p sieve --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p sieve --test property_tests
//! ```

use proptest::prelude::*;

use sieve::batch::plan;
use sieve::{run_pipeline, Cell, MockProvider, ResultAssembler, RuleBasedCleaner, Table};

// =============================================================================
// Test Strategies
// =============================================================================

/// A cell that survives a CSV round trip unchanged.
fn csv_safe_cell() -> impl Strategy<Value = Cell> + Clone {
    prop_oneof![
        3 => (-1000i32..1000).prop_map(|n| Cell::Number(n as f64)),
        3 => "v[0-9]{1,3}".prop_map(Cell::Text),
        1 => Just(Cell::Null),
    ]
}

/// A cell with messy whitespace, few distinct values and frequent nulls.
fn messy_cell() -> impl Strategy<Value = Cell> + Clone {
    prop_oneof![
        2 => (0i32..4).prop_map(|n| Cell::Number(n as f64)),
        2 => "[ ]{0,2}[ab]{1,2}[ \t]{0,2}".prop_map(Cell::Text),
        1 => Just(Cell::Null),
    ]
}

/// Text that would parse as a number or a null if read loosely.
fn code_like_text() -> impl Strategy<Value = Cell> + Clone {
    prop_oneof![
        3 => "0[0-9]{1,4}".prop_map(Cell::Text),
        1 => prop::sample::select(vec!["None", "NA", "null", "nan"]).prop_map(Cell::text),
    ]
}

/// Tables whose rows are unique thanks to a leading id column.
fn keyed_table(cell: impl Strategy<Value = Cell> + Clone) -> impl Strategy<Value = Table> {
    (1usize..4, 0usize..60).prop_flat_map(move |(extra_cols, rows)| {
        prop::collection::vec(prop::collection::vec(cell.clone(), extra_cols), rows).prop_map(
            move |body| {
                let mut headers = vec!["id".to_string()];
                headers.extend((0..extra_cols).map(|c| format!("col{}", c)));
                let rows = body
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut row)| {
                        row.insert(0, Cell::Number(i as f64));
                        row
                    })
                    .collect();
                Table::new(headers, rows)
            },
        )
    })
}

/// Tables with no nulls, where duplicate rows are common.
fn dense_table() -> impl Strategy<Value = Table> {
    let cell = prop_oneof![
        (0i32..3).prop_map(|n| Cell::Number(n as f64)),
        "[ ]?[xy][ ]?".prop_map(Cell::Text),
    ];
    (1usize..4, 0usize..40).prop_flat_map(move |(cols, rows)| {
        prop::collection::vec(prop::collection::vec(cell.clone(), cols), rows).prop_map(
            move |rows| Table::new((0..cols).map(|c| format!("c{}", c)).collect(), rows),
        )
    })
}

// =============================================================================
// Batch planning
// =============================================================================

proptest! {
    #[test]
    fn batches_partition_rows_in_order(table in keyed_table(csv_safe_cell()), batch_size in 1usize..30) {
        let batches: Vec<_> = plan(&table, batch_size).unwrap().collect();

        let rejoined: Vec<Vec<Cell>> = batches.iter().flat_map(|b| b.rows().to_vec()).collect();
        prop_assert_eq!(&rejoined, &table.rows);
        prop_assert_eq!(batches.len(), table.row_count().div_ceil(batch_size));

        for (i, batch) in batches.iter().enumerate() {
            prop_assert_eq!(batch.number(), i + 1);
            if i + 1 < batches.len() {
                prop_assert_eq!(batch.len(), batch_size);
            } else {
                prop_assert!(batch.len() >= 1 && batch.len() <= batch_size);
            }
        }
    }

    #[test]
    fn single_batch_when_size_covers_table(table in keyed_table(csv_safe_cell())) {
        let count = plan(&table, table.row_count().max(1)).unwrap().count();
        prop_assert_eq!(count, usize::from(table.row_count() > 0));
    }
}

// =============================================================================
// Assembly
// =============================================================================

proptest! {
    #[test]
    fn assembly_preserves_batch_order(table in keyed_table(csv_safe_cell()), batch_size in 1usize..30) {
        let responses: Vec<String> = plan(&table, batch_size)
            .unwrap()
            .map(|batch| batch.to_csv().unwrap())
            .collect();

        let assembled = ResultAssembler::new(table.schema()).assemble(&responses).unwrap();

        prop_assert_eq!(assembled.headers, table.headers);
        prop_assert_eq!(assembled.rows, table.rows);
    }

    #[test]
    fn echo_pipeline_returns_rule_cleaned_table(table in keyed_table(messy_cell()), batch_size in 1usize..30) {
        let expected = RuleBasedCleaner::new().clean(table.clone()).unwrap();

        let result = run_pipeline(table, MockProvider::new(), batch_size).unwrap();

        prop_assert_eq!(result.table.rows.len(), expected.rows.len());
        prop_assert_eq!(result.table, expected);
    }

    #[test]
    fn echo_pipeline_keeps_code_like_text(table in keyed_table(code_like_text()), batch_size in 1usize..30) {
        let result = run_pipeline(table.clone(), MockProvider::new(), batch_size).unwrap();

        prop_assert_eq!(result.table, table);
    }
}

// =============================================================================
// Rule-based cleaner
// =============================================================================

proptest! {
    #[test]
    fn cleaning_is_stable_for_keyed_tables(table in keyed_table(messy_cell())) {
        let cleaner = RuleBasedCleaner::new();
        let once = cleaner.clean(table).unwrap();
        let (twice, report) = cleaner.clean_with_report(once.clone()).unwrap();

        prop_assert_eq!(twice, once);
        prop_assert!(report.is_noop());
    }

    #[test]
    fn cleaning_is_stable_without_nulls(table in dense_table()) {
        let cleaner = RuleBasedCleaner::new();
        let once = cleaner.clean(table).unwrap();
        let twice = cleaner.clean(once.clone()).unwrap();

        prop_assert_eq!(twice, once);
    }

    #[test]
    fn cleaning_keeps_first_occurrences_in_order(table in dense_table()) {
        let cleaned = RuleBasedCleaner::new().clean(table.clone()).unwrap();

        prop_assert!(cleaned.row_count() <= table.row_count());
        for pair in cleaned.rows.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }
}
