//! `covloop batch`: independent runs over a manifest of targets.
//!
//! Manifest format:
//!
//! ```yaml
//! runs:
//!   - repo: encode/httpx
//!     version: "0.27.0"
//!     code_file: httpx/_urls.py
//!     max_iterations: 3   # optional
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::application::RunSettings;
use crate::cli::display::{format_percent, list_table, output, CommandOutput};
use crate::domain::models::{Config, TargetCoordinates};

/// Arguments for `covloop batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// YAML manifest listing the targets
    #[arg(long)]
    pub manifest: PathBuf,

    /// Runs executed at the same time
    #[arg(long, default_value = "2")]
    pub concurrency: usize,

    /// Local checkout used for context mining
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
}

/// Batch manifest loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Targets to run.
    pub runs: Vec<ManifestEntry>,
}

/// One manifest target.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Repository identifier.
    pub repo: String,
    /// Repository version or tag.
    pub version: String,
    /// File under test.
    pub code_file: String,
    /// Per-target enhancement budget.
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl ManifestEntry {
    fn target(&self) -> TargetCoordinates {
        TargetCoordinates {
            repo: self.repo.clone(),
            version: self.version.clone(),
            code_file: self.code_file.clone(),
        }
    }
}

impl Manifest {
    /// Parse a manifest, rejecting one with no runs.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(text).context("Invalid batch manifest")?;
        if manifest.runs.is_empty() {
            bail!("Batch manifest lists no runs");
        }
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_yaml(&text)
    }
}

/// Outcome of one manifest target.
#[derive(Debug, Serialize)]
pub struct BatchRunRow {
    /// Repository identifier.
    pub repo: String,
    /// File under test.
    pub code_file: String,
    /// Run identifier, when the run started.
    pub run_id: Option<String>,
    /// Exit path, when the run completed.
    pub finish_reason: Option<String>,
    /// Evaluated attempts.
    pub iterations: Option<u32>,
    /// Coverage of the last attempt.
    pub final_coverage: Option<f64>,
    /// Error that stopped the target.
    pub error: Option<String>,
}

/// Result of a whole batch.
#[derive(Debug, Serialize)]
pub struct BatchOutput {
    /// One row per manifest target.
    pub runs: Vec<BatchRunRow>,
    /// Targets that completed.
    pub succeeded: usize,
    /// Targets that errored.
    pub failed: usize,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["target", "run", "finish", "iters", "coverage"]);
        for row in &self.runs {
            let finish = match (&row.finish_reason, &row.error) {
                (Some(reason), _) => reason.clone(),
                (None, Some(err)) => format!("{} {err}", console::style("aborted:").red()),
                (None, None) => "-".to_string(),
            };
            table.add_row(vec![
                format!("{}:{}", row.repo, row.code_file),
                row.run_id.clone().unwrap_or_else(|| "-".to_string()),
                finish,
                row.iterations.map_or_else(|| "-".to_string(), |i| i.to_string()),
                format_percent(row.final_coverage),
            ]);
        }
        format!(
            "{} run(s): {} finished, {} aborted\n{table}",
            self.runs.len(),
            self.succeeded,
            self.failed
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run every manifest target with bounded concurrency.
pub async fn execute(args: BatchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let manifest = Manifest::load(&args.manifest).await?;
    let store = super::artifact_store(config);
    let base = RunSettings::from_config(config);

    // One controller per run; runs share nothing but the store root.
    let mut jobs = Vec::with_capacity(manifest.runs.len());
    for entry in manifest.runs {
        let settings = entry
            .max_iterations
            .map_or(base, |max| base.with_max_iterations(max));
        let controller =
            super::build_controller(config, settings, &args.repo_root, std::sync::Arc::clone(&store))?;
        jobs.push((entry, controller));
    }

    let rows: Vec<BatchRunRow> = stream::iter(jobs)
        .map(|(entry, controller)| async move {
            let result = controller.run(entry.target()).await;
            match result {
                Ok(outcome) => BatchRunRow {
                    repo: entry.repo,
                    code_file: entry.code_file,
                    run_id: Some(outcome.run_id),
                    finish_reason: Some(outcome.finish_reason.as_str().to_string()),
                    iterations: Some(outcome.summary.iterations),
                    final_coverage: outcome.summary.final_coverage,
                    error: None,
                },
                Err(e) => BatchRunRow {
                    repo: entry.repo,
                    code_file: entry.code_file,
                    run_id: None,
                    finish_reason: None,
                    iterations: None,
                    final_coverage: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    let result = BatchOutput {
        succeeded: rows.len() - failed,
        failed,
        runs: rows,
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parses() {
        let manifest = Manifest::from_yaml(
            "runs:\n  - repo: encode/httpx\n    version: '0.27'\n    code_file: httpx/_urls.py\n  - repo: django/django\n    version: '5.0'\n    code_file: django/views/static.py\n    max_iterations: 4\n",
        )
        .unwrap();
        assert_eq!(manifest.runs.len(), 2);
        assert_eq!(manifest.runs[0].max_iterations, None);
        assert_eq!(manifest.runs[1].max_iterations, Some(4));
    }

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(Manifest::from_yaml("runs: []\n").is_err());
    }
}
