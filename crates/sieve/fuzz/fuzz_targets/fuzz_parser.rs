//! Fuzz target for the upload parser.
//!
//! This fuzzer tests that the CSV/TSV/JSON parser:
//! 1. Never panics on malformed input
//! 2. Handles all delimiter combinations
//! 3. Doesn't allocate unbounded memory

#![no_main]

use libfuzzer_sys::fuzz_target;
use sieve::Parser;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    let _ = parser.parse_upload("fuzz.csv", data);
    let _ = parser.parse_upload("fuzz.json", data);
});
