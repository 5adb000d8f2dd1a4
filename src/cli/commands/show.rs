//! `covloop show`: reload a persisted run, or list every stored run.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::run::{attempts_table, AttemptRow};
use crate::cli::display::{format_percent, list_table, output, CommandOutput};
use crate::domain::models::{Config, RunSummary};
use crate::domain::ports::ArtifactStore;
use crate::infrastructure::storage::RunArtifacts;

/// Arguments for `covloop show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Run identifier, e.g. `run_1718000000000_ab12cd34`. Omit to list runs.
    pub run_id: Option<String>,
}

/// Listing of stored runs.
#[derive(Debug, Serialize)]
pub struct RunListOutput {
    /// Stored runs; `None` marks a run without a summary yet.
    pub runs: Vec<(String, Option<RunSummary>)>,
}

impl CommandOutput for RunListOutput {
    fn to_human(&self) -> String {
        if self.runs.is_empty() {
            return "No runs found.".to_string();
        }
        let mut table = list_table(&["run", "target", "finish", "attempts", "coverage"]);
        for (run_id, summary) in &self.runs {
            match summary {
                Some(s) => table.add_row(vec![
                    run_id.clone(),
                    s.target.code_file.clone(),
                    s.finish_reason.to_string(),
                    s.iterations.to_string(),
                    format_percent(s.final_coverage),
                ]),
                None => table.add_row(vec![
                    run_id.clone(),
                    "-".to_string(),
                    "in progress".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]),
            };
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// A persisted run with its attempts and events.
#[derive(Debug, Serialize)]
pub struct ShowOutput {
    /// Run summary.
    pub summary: RunSummary,
    /// One row per attempt.
    pub attempts: Vec<AttemptRow>,
    /// Event log lines.
    pub events: Vec<String>,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            format!("Run {}", console::style(&s.run_id).bold()),
            format!("Target:    {} @ {} :: {}", s.target.repo, s.target.version, s.target.code_file),
            format!("Finished:  {} ({} attempt(s))", s.finish_reason, s.iterations),
            format!(
                "Coverage:  {}  Mutation: {}",
                format_percent(s.final_coverage),
                format_percent(s.final_mutation_score)
            ),
            format!(
                "LLM:       ${:.4}, {} in / {} out tokens, {:.1}s",
                s.total_llm_cost,
                s.total_llm_input_tokens,
                s.total_llm_output_tokens,
                s.total_llm_duration_seconds
            ),
            format!(
                "Runner:    {:.1}s  Static analysis: {:.1}s  Total: {:.1}s",
                s.total_runner_duration_seconds,
                s.total_static_analysis_duration_seconds,
                s.total_duration_seconds
            ),
        ];
        if let Some(err) = &s.error {
            lines.push(format!("{} {err}", console::style("Error:").red().bold()));
        }
        if !self.attempts.is_empty() {
            lines.push(String::new());
            lines.push(attempts_table(&self.attempts));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Show one run, or list every run when no id is given.
pub async fn execute(args: ShowArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = super::artifact_store(config);
    let Some(run_id) = args.run_id else {
        let result = list_runs(store).await?;
        output(&result, json_mode);
        return Ok(());
    };

    let artifacts = RunArtifacts::new(store, &run_id);
    let summary = artifacts
        .read_summary()
        .await
        .with_context(|| format!("No summary for run {run_id}"))?;
    let attempts = artifacts
        .load_attempts()
        .await
        .context("Failed to load attempts")?;
    let events = artifacts.read_events().await?;

    let result = ShowOutput {
        summary,
        attempts: attempts.iter().map(AttemptRow::from_attempt).collect(),
        events,
    };
    output(&result, json_mode);
    Ok(())
}

async fn list_runs(store: Arc<dyn ArtifactStore>) -> Result<RunListOutput> {
    let ids = store.list_runs().await.context("Failed to list runs")?;
    let mut runs = Vec::with_capacity(ids.len());
    for run_id in ids {
        let summary = RunArtifacts::new(Arc::clone(&store), &run_id)
            .read_summary()
            .await
            .ok();
        runs.push((run_id, summary));
    }
    Ok(RunListOutput { runs })
}
