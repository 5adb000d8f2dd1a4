//! Static-analysis payload for a candidate test module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output of one lint/type-check tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    /// `false` when the tool is not installed; such tools never report issues.
    pub available: bool,
    /// Issues found; always zero for unavailable tools.
    #[serde(default)]
    pub issue_count: u32,
    /// Tool exit code, when it ran.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Tail of combined stdout/stderr.
    #[serde(default)]
    pub output: String,
}

impl LintReport {
    /// Report for a tool that is not installed.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            issue_count: 0,
            exit_code: None,
            output: String::new(),
        }
    }
}

/// Syntax validity, structural metrics and per-tool lint results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMetrics {
    /// Whether the candidate parses.
    pub syntax_ok: bool,
    /// Parser message with line, when it does not.
    #[serde(default)]
    pub syntax_error: Option<String>,
    /// Physical lines.
    #[serde(default)]
    pub line_count: usize,
    /// Function definitions, including methods.
    #[serde(default)]
    pub function_count: usize,
    /// Class definitions.
    #[serde(default)]
    pub class_count: usize,
    /// Mean function body length in lines.
    #[serde(default)]
    pub avg_function_length: f64,
    /// Longest function body in lines.
    #[serde(default)]
    pub max_function_length: usize,
    /// Occurrences of `todo`, case-insensitive.
    #[serde(default)]
    pub todo_count: usize,
    /// Count of branching constructs.
    #[serde(default)]
    pub complexity: usize,
    /// Per-tool lint results keyed by tool name.
    #[serde(default)]
    pub linters: BTreeMap<String, LintReport>,
}

impl Default for StaticMetrics {
    fn default() -> Self {
        Self {
            syntax_ok: true,
            syntax_error: None,
            line_count: 0,
            function_count: 0,
            class_count: 0,
            avg_function_length: 0.0,
            max_function_length: 0,
            todo_count: 0,
            complexity: 0,
            linters: BTreeMap::new(),
        }
    }
}

impl StaticMetrics {
    /// Aggregate the per-tool lint reports.
    pub fn lint_summary(&self) -> LintSummary {
        let mut summary = LintSummary::default();
        for (tool, report) in &self.linters {
            if report.available {
                summary.issues += report.issue_count;
            } else {
                summary.missing.push(tool.clone());
            }
            summary.reports.insert(
                tool.clone(),
                LintToolSummary {
                    available: report.available,
                    issue_count: report.issue_count,
                    exit_code: report.exit_code,
                },
            );
        }
        summary
    }
}

/// Condensed lint view carried by reliability scores and critiques.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    /// Issues across available tools only.
    pub issues: u32,
    /// Tools that could not be run.
    pub missing: Vec<String>,
    /// Per-tool results without captured output.
    #[serde(default)]
    pub reports: BTreeMap<String, LintToolSummary>,
}

/// Lint result for one tool, without its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintToolSummary {
    /// Whether the tool ran.
    pub available: bool,
    /// Issues found.
    pub issue_count: u32,
    /// Tool exit code.
    pub exit_code: Option<i32>,
}
