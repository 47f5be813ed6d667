//! Records of what the rule-based pass changed.

use serde::{Deserialize, Serialize};

use crate::table::Cell;

/// How missing values in a column were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Arithmetic mean of the column's numbers.
    Mean,
    /// Most frequent value; ties go to the value seen first.
    Mode,
}

/// Imputation applied to a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    /// Column affected.
    pub column: String,
    /// Strategy used.
    pub strategy: ImputeStrategy,
    /// Value written into the missing cells.
    pub value: Cell,
    /// Number of cells filled.
    pub cells_filled: usize,
}

impl Imputation {
    /// Get a human-readable description of the imputation.
    pub fn description(&self) -> String {
        let strategy = match self.strategy {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Mode => "mode",
        };
        format!(
            "Filled {} missing value(s) in '{}' with {} '{}'",
            self.cells_filled, self.column, strategy, self.value
        )
    }
}

/// Summary of a rule-based cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    /// Text cells whose whitespace changed (including ones that became null).
    pub cells_normalized: usize,

    /// Fully duplicate rows removed.
    pub duplicates_removed: usize,

    /// Per-column imputations, in column order.
    pub imputations: Vec<Imputation>,
}

impl RuleReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of cells filled by imputation.
    pub fn cells_imputed(&self) -> usize {
        self.imputations.iter().map(|i| i.cells_filled).sum()
    }

    /// Whether the pass changed anything.
    pub fn is_noop(&self) -> bool {
        self.cells_normalized == 0 && self.duplicates_removed == 0 && self.imputations.is_empty()
    }
}
