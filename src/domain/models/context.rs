//! Context mined from the file under test.

use serde::{Deserialize, Serialize};

/// Insights mined from the target file before generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPack {
    /// One-line description of the module.
    pub summary: String,
    /// Top-level function and class names.
    pub symbols: Vec<String>,
    /// First line of selected docstrings.
    pub docstrings: Vec<String>,
}

impl ContextPack {
    /// Whether mining found nothing.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.symbols.is_empty() && self.docstrings.is_empty()
    }
}
