//! Rule-based cleaning applied to a whole table before batching.

mod engine;
mod operations;

pub use engine::RuleBasedCleaner;
pub use operations::{ImputeStrategy, Imputation, RuleReport};
