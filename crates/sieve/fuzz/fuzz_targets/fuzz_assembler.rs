//! Fuzz target for assembling model output.
//!
//! Arbitrary model text must produce a table or an `AssemblyError`, never a
//! panic, and a successful table must match the expected width.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sieve::{ColumnKind, ColumnSpec, ResultAssembler, Schema};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let schema = Schema::new(vec![
        ColumnSpec::new("name", ColumnKind::Text),
        ColumnSpec::new("age", ColumnKind::Numeric),
    ]);
    let responses: Vec<&str> = text.split('\u{0}').collect();

    if let Ok(table) = ResultAssembler::new(schema).assemble(&responses) {
        assert!(table.rows.iter().all(|row| row.len() == 2));
    }
});
