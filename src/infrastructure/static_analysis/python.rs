//! Static analyzer for Python test candidates.

use async_trait::async_trait;

use super::lint::LintTool;
use super::syntax::structural_metrics;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{StaticAnalysisConfig, StaticMetrics};
use crate::domain::ports::StaticAnalyzer;

/// File name given to the scratch copy; the `test_` prefix keeps
/// pytest-aware linters happy.
const SCRATCH_FILE: &str = "test_candidate.py";

/// Syntax metrics plus configured lint tools.
pub struct PythonStaticAnalyzer {
    tools: Vec<LintTool>,
}

impl PythonStaticAnalyzer {
    /// Analyzer using the configured lint tools.
    pub fn new(config: &StaticAnalysisConfig) -> Self {
        Self {
            tools: config.lint_tools.iter().cloned().map(LintTool::new).collect(),
        }
    }

    /// Analyzer that only parses; no subprocesses.
    pub fn without_linters() -> Self {
        Self { tools: Vec::new() }
    }
}

#[async_trait]
impl StaticAnalyzer for PythonStaticAnalyzer {
    async fn analyze(&self, source: &str) -> DomainResult<StaticMetrics> {
        let mut metrics = structural_metrics(source)?;
        if !metrics.syntax_ok || self.tools.is_empty() {
            return Ok(metrics);
        }

        let scratch = tempfile::Builder::new()
            .prefix("covloop-lint-")
            .tempdir()
            .map_err(|e| DomainError::StaticAnalysisFailed(format!("Failed to create scratch dir: {e}")))?;
        let path = scratch.path().join(SCRATCH_FILE);
        tokio::fs::write(&path, source)
            .await
            .map_err(|e| DomainError::StaticAnalysisFailed(format!("Failed to write scratch copy: {e}")))?;

        for tool in &self.tools {
            let report = tool.run(&path).await;
            metrics.linters.insert(tool.name().to_string(), report);
        }

        Ok(metrics)
    }
}
