//! `covloop run`: one target, one run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::application::{RunOutcome, RunSettings};
use crate::cli::display::{colorize_level, colorize_status, format_percent, list_table, output, CommandOutput};
use crate::domain::models::{Config, TargetCoordinates};

/// Arguments for `covloop run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository identifier, e.g. `encode/httpx`
    #[arg(long)]
    pub repo: String,

    /// Repository version or tag
    #[arg(long = "version")]
    pub version: String,

    /// Target file, relative to the repository root
    #[arg(long)]
    pub code_file: String,

    /// Enhancement budget (overrides `max_iterations`)
    #[arg(long)]
    pub max_iters: Option<u32>,

    /// Local checkout used for context mining
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
}

/// One evaluated attempt, flattened for display.
#[derive(Debug, Serialize)]
pub struct AttemptRow {
    /// Attempt index.
    pub index: u32,
    /// Runner status label.
    pub status: String,
    /// Measured coverage.
    pub coverage: f64,
    /// Measured mutation score, when available.
    pub mutation_score: Option<f64>,
    /// Pre-execution level.
    pub pre_level: String,
    /// Post-execution level.
    pub post_level: String,
    /// Whether progress stalled at this attempt.
    pub no_progress: bool,
    /// Critique instructions.
    pub instructions: Vec<String>,
}

impl AttemptRow {
    /// Flatten an attempt into a display row.
    pub fn from_attempt(attempt: &crate::domain::models::Attempt) -> Self {
        Self {
            index: attempt.index,
            status: attempt.response.status.as_str().to_string(),
            coverage: attempt.response.effective_coverage(),
            mutation_score: attempt
                .response
                .mutation_available()
                .then_some(attempt.response.mutation_score),
            pre_level: attempt.pre_reliability.level.as_str().to_string(),
            post_level: attempt.post_reliability.level.as_str().to_string(),
            no_progress: attempt.critique.no_progress,
            instructions: attempt.critique.instructions.clone(),
        }
    }
}

/// Render attempts as a table.
pub fn attempts_table(rows: &[AttemptRow]) -> String {
    let mut table = list_table(&["#", "status", "coverage", "mutation", "pre", "post", "fixes"]);
    for row in rows {
        table.add_row(vec![
            row.index.to_string(),
            colorize_status(&row.status).to_string(),
            format_percent(Some(row.coverage)),
            format_percent(row.mutation_score),
            colorize_level(&row.pre_level).to_string(),
            colorize_level(&row.post_level).to_string(),
            row.instructions.len().to_string(),
        ]);
    }
    table.to_string()
}

/// Result of a single run.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Run identifier.
    pub run_id: String,
    /// Exit path label.
    pub finish_reason: String,
    /// Evaluated attempts.
    pub iterations: u32,
    /// Coverage of the last attempt.
    pub final_coverage: Option<f64>,
    /// Mutation score of the last attempt.
    pub final_mutation_score: Option<f64>,
    /// Estimated generation cost in USD.
    pub total_llm_cost: f64,
    /// Wall time of the run.
    pub total_duration_seconds: f64,
    /// One row per attempt.
    pub attempts: Vec<AttemptRow>,
}

impl From<&RunOutcome> for RunOutput {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            run_id: outcome.run_id.clone(),
            finish_reason: outcome.finish_reason.as_str().to_string(),
            iterations: outcome.summary.iterations,
            final_coverage: outcome.summary.final_coverage,
            final_mutation_score: outcome.summary.final_mutation_score,
            total_llm_cost: outcome.summary.total_llm_cost,
            total_duration_seconds: outcome.summary.total_duration_seconds,
            attempts: outcome.attempts.iter().map(AttemptRow::from_attempt).collect(),
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Run {}", console::style(&self.run_id).bold()),
            format!(
                "Finished: {} after {} attempt(s) in {:.1}s",
                self.finish_reason, self.iterations, self.total_duration_seconds
            ),
            format!(
                "Coverage: {}  Mutation: {}  LLM cost: ${:.4}",
                format_percent(self.final_coverage),
                format_percent(self.final_mutation_score),
                self.total_llm_cost
            ),
        ];
        if !self.attempts.is_empty() {
            lines.push(String::new());
            lines.push(attempts_table(&self.attempts));
        }
        if let Some(last) = self.attempts.last() {
            if !last.instructions.is_empty() {
                lines.push(String::new());
                lines.push("Outstanding instructions:".to_string());
                lines.extend(last.instructions.iter().map(|i| format!("  - {i}")));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run the loop for one target and print the outcome.
pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut settings = RunSettings::from_config(config);
    if let Some(max) = args.max_iters {
        settings = settings.with_max_iterations(max);
    }
    let store = super::artifact_store(config);
    let controller = super::build_controller(config, settings, &args.repo_root, store)?;

    let target = TargetCoordinates {
        repo: args.repo,
        version: args.version,
        code_file: args.code_file,
    };
    let outcome = controller
        .run(target)
        .await
        .context("Run aborted")?;

    output(&RunOutput::from(&outcome), json_mode);
    Ok(())
}
