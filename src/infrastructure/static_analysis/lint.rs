//! Lint/type-check tools run as subprocesses against a scratch copy.

use std::io::ErrorKind;
use std::path::Path;

use tokio::process::Command;

use crate::domain::models::{LintReport, LintToolConfig};

/// Characters of combined output kept per tool.
pub const OUTPUT_TAIL_CHARS: usize = 4000;

/// One configured lint tool.
#[derive(Debug, Clone)]
pub struct LintTool {
    config: LintToolConfig,
}

impl LintTool {
    /// Wrap a configured tool.
    pub fn new(config: LintToolConfig) -> Self {
        Self { config }
    }

    /// Tool name used in reports.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Count issues in combined tool output.
    ///
    /// pylint is counted by "error" and "fatal" mentions, everything else by
    /// "error:" markers. Matching is case-insensitive.
    pub fn count_issues(&self, output: &str) -> u32 {
        let lowered = output.to_lowercase();
        let count = if self.config.name == "pylint" {
            lowered.matches("error").count() + lowered.matches("fatal").count()
        } else {
            lowered.matches("error:").count()
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Run the tool on `path` with the file's directory as working directory.
    ///
    /// A missing executable is reported as unavailable. Other spawn failures
    /// are kept as an available tool with exit code -1 and no issues.
    pub async fn run(&self, path: &Path) -> LintReport {
        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args).arg(path).kill_on_drop(true);
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(tool = %self.config.name, "lint tool not installed");
                return LintReport::unavailable();
            }
            Err(e) => {
                tracing::warn!(tool = %self.config.name, error = %e, "failed to spawn lint tool");
                return LintReport {
                    available: true,
                    issue_count: 0,
                    exit_code: Some(-1),
                    output: format!("{} failed: {e}", self.config.name),
                };
            }
        };

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let issue_count = self.count_issues(&combined);

        tracing::debug!(
            tool = %self.config.name,
            exit_code = ?output.status.code(),
            issue_count,
            "lint tool finished"
        );

        LintReport {
            available: true,
            issue_count,
            exit_code: output.status.code(),
            output: tail_chars(&combined, OUTPUT_TAIL_CHARS),
        }
    }
}

/// Last `max` characters of `text`.
fn tail_chars(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    text.chars().skip(total - max).collect()
}
