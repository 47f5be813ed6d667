//! Context hints added to cleaning prompts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// User-provided context that helps the model clean a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextHints {
    /// Name of the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,

    /// Domain of the data (e.g., "retail", "clinical", "survey").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Descriptions of individual columns.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_hints: BTreeMap<String, String>,
}

impl ContextHints {
    /// Create empty context hints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset name.
    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    /// Set the domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Add a column hint.
    pub fn with_column_hint(
        mut self,
        column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.column_hints.insert(column.into(), description.into());
        self
    }

    /// Check if any hints are provided.
    pub fn is_empty(&self) -> bool {
        self.dataset_name.is_none() && self.domain.is_none() && self.column_hints.is_empty()
    }

    /// Format hints as lines for a prompt. Empty when no hints are set.
    pub fn to_prompt_string(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref name) = self.dataset_name {
            parts.push(format!("Dataset: {}", name));
        }
        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain: {}", domain));
        }
        for (column, description) in &self.column_hints {
            parts.push(format!("Column '{}': {}", column, description));
        }

        parts.join("\n")
    }
}
