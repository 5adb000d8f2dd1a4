//! Run controller: owns the generate → execute → critique → refine loop.
//!
//! One [`RunController`] can drive many runs; each call to
//! [`RunController::run`] creates its own [`Run`] with private budget and
//! progress state and its own artifact namespace. Within a run every step is
//! awaited before the next starts.
//!
//! Failure semantics:
//! - A failing or erroring [`ExecutionResult`](crate::domain::models::ExecutionResult)
//!   is feedback, not an error.
//! - An `Err` from any collaborator aborts the run. The summary is written
//!   with `finish_reason = aborted` before the error is returned.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Attempt, AttemptMetrics, Config, ContextPack, Critique, FinishReason, GenerationConfidence,
    ProgressThresholds, Run, RunSummary, RunTargets, RunnerRequest, RunnerResponse,
    TargetCoordinates,
};
use crate::domain::ports::{
    ArtifactStore, ContextMiner, EnhanceTask, GenerationRequest, StaticAnalyzer, TestEnhancer,
    TestGenerator, TestRunner,
};
use crate::infrastructure::storage::run_artifacts::{CONTEXT, RUN_SUMMARY, TARGET_CODE};
use crate::infrastructure::storage::{AttemptArtifact, RunArtifacts};
use crate::services::{analyze, decide, score_post_execution, score_pre_execution, update_progress, Route};

/// Collaborators a run talks to.
#[derive(Clone)]
pub struct RunPorts {
    /// Produces the first candidate.
    pub generator: Arc<dyn TestGenerator>,
    /// Revises a candidate from its critique.
    pub enhancer: Arc<dyn TestEnhancer>,
    /// Executes candidates and reports coverage.
    pub runner: Arc<dyn TestRunner>,
    /// `None` skips static analysis entirely.
    pub static_analyzer: Option<Arc<dyn StaticAnalyzer>>,
    /// Mines context before generation.
    pub context_miner: Arc<dyn ContextMiner>,
    /// Persists every artifact of the run.
    pub store: Arc<dyn ArtifactStore>,
}

/// Loop limits and thresholds shared by every run of a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    /// Enhancement budget: attempts `0..=max_iterations` may be evaluated.
    pub max_iterations: u32,
    /// Coverage and mutation targets.
    pub targets: RunTargets,
    /// Stagnation thresholds.
    pub progress: ProgressThresholds,
}

impl RunSettings {
    /// Settings taken from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_iterations: config.max_iterations,
            targets: config.targets,
            progress: config.progress,
        }
    }

    /// Override the enhancement budget.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            targets: RunTargets::default(),
            progress: ProgressThresholds::default(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Run identifier.
    pub run_id: String,
    /// Exit path taken.
    pub finish_reason: FinishReason,
    /// Every evaluated attempt, in order.
    pub attempts: Vec<Attempt>,
    /// Summary as persisted.
    pub summary: RunSummary,
}

/// Candidate waiting to be evaluated.
struct Candidate {
    source: String,
    confidence: Option<GenerationConfidence>,
    enhancer_duration_seconds: Option<f64>,
}

/// Drives one run through generate, execute, critique, and refine.
pub struct RunController {
    ports: RunPorts,
    settings: RunSettings,
}

impl RunController {
    /// Controller over `ports` with fixed `settings`.
    pub fn new(ports: RunPorts, settings: RunSettings) -> Self {
        Self { ports, settings }
    }

    /// Limits this controller applies.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Artifact view for a run id in this controller's store.
    pub fn artifacts(&self, run_id: &str) -> RunArtifacts {
        RunArtifacts::new(Arc::clone(&self.ports.store), run_id)
    }

    /// Drive one run to completion.
    ///
    /// A summary is always persisted, including when a collaborator error
    /// aborts the run.
    pub async fn run(&self, target: TargetCoordinates) -> DomainResult<RunOutcome> {
        let mut run = Run::new(target, self.settings.max_iterations, self.settings.targets);
        let artifacts = self.artifacts(&run.id);
        let span = tracing::info_span!(
            "run",
            run_id = %run.id,
            repo = %run.target.repo,
            code_file = %run.target.code_file,
        );

        async {
            info!(
                max_iterations = run.max_iterations,
                target_coverage = run.targets.coverage,
                target_mutation = run.targets.mutation,
                generator = self.ports.generator.name(),
                runner = self.ports.runner.name(),
                "Starting run"
            );

            match self.drive(&mut run, &artifacts).await {
                Ok(reason) => {
                    let summary = run.summarize(reason, None);
                    artifacts.write_json(RUN_SUMMARY, &summary).await?;
                    artifacts
                        .event(&format!("finish reason={reason} iter={}", summary.iterations))
                        .await?;
                    info!(
                        finish_reason = %reason,
                        iterations = summary.iterations,
                        final_coverage = ?summary.final_coverage,
                        total_llm_cost = summary.total_llm_cost,
                        "Run finished"
                    );
                    Ok(RunOutcome {
                        run_id: run.id.clone(),
                        finish_reason: reason,
                        attempts: std::mem::take(&mut run.attempts),
                        summary,
                    })
                }
                Err(error) => {
                    self.record_abort(&run, &artifacts, &error).await;
                    Err(error)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Persist the aborted summary; storage failures here are only logged so
    /// the original error reaches the caller.
    async fn record_abort(&self, run: &Run, artifacts: &RunArtifacts, error: &DomainError) {
        warn!(error = %error, attempts = run.attempts.len(), "Run aborted");
        let summary = run.summarize(FinishReason::Aborted, Some(error.to_string()));
        if let Err(e) = artifacts.write_json(RUN_SUMMARY, &summary).await {
            warn!(error = %e, "Failed to write aborted run summary");
        }
        let line = format!("finish reason={} iter={}", FinishReason::Aborted, summary.iterations);
        if let Err(e) = artifacts.event(&line).await {
            warn!(error = %e, "Failed to append abort event");
        }
    }

    async fn drive(&self, run: &mut Run, artifacts: &RunArtifacts) -> DomainResult<FinishReason> {
        let context = self
            .ports
            .context_miner
            .mine(Path::new(&run.target.code_file))
            .await?;
        artifacts.write_json(CONTEXT, &context).await?;

        let target_source = self.ports.runner.fetch_target_source(&run.target).await?;
        if let Some(source) = &target_source {
            artifacts.write_text(TARGET_CODE, source).await?;
        }

        let mut candidate = self.generate(run, &context, target_source.as_deref()).await?;

        loop {
            let index = u32::try_from(run.attempts.len()).unwrap_or(u32::MAX);
            let attempt = self.evaluate(run, artifacts, index, candidate).await?;
            let coverage = attempt.response.effective_coverage();
            let critique = attempt.critique.clone();
            let current_source = attempt.source.clone();
            run.attempts.push(attempt);

            if coverage >= run.targets.coverage {
                return Ok(FinishReason::CoverageMet);
            }

            let route = decide(&critique, index, run.max_iterations);
            info!(attempt = index, route = %route, no_progress = critique.no_progress, "Route decided");
            if route == Route::Finish {
                return Ok(finish_reason(&critique, index, run.max_iterations));
            }

            artifacts
                .event(&format!("attempt={} state=ENHANCE", index + 1))
                .await?;
            let task = EnhanceTask {
                target: run.target.clone(),
                attempt: index + 1,
                current_source,
                instructions: critique.instructions,
                uncovered_lines: critique.missing_lines,
                context: context.clone(),
                target_source: target_source.clone(),
            };
            candidate = self.enhance(run, &task).await?;
        }
    }

    async fn generate(
        &self,
        run: &mut Run,
        context: &ContextPack,
        target_source: Option<&str>,
    ) -> DomainResult<Candidate> {
        let request = GenerationRequest {
            target: run.target.clone(),
            context: context.clone(),
            target_source: target_source.map(str::to_string),
        };
        let started = Instant::now();
        let output = self.ports.generator.generate(&request).await?;
        run.budget
            .record_generation(started.elapsed(), output.confidence.as_ref());

        Ok(Candidate {
            source: output.source,
            confidence: output.confidence,
            enhancer_duration_seconds: None,
        })
    }

    async fn enhance(&self, run: &mut Run, task: &EnhanceTask) -> DomainResult<Candidate> {
        let started = Instant::now();
        let output = self.ports.enhancer.enhance(task).await?;
        let elapsed = started.elapsed();
        run.budget
            .record_generation(elapsed, output.confidence.as_ref());

        Ok(Candidate {
            source: output.source,
            confidence: output.confidence,
            enhancer_duration_seconds: Some(elapsed.as_secs_f64()),
        })
    }

    /// Evaluate one candidate, persisting each piece as soon as it exists.
    async fn evaluate(
        &self,
        run: &mut Run,
        artifacts: &RunArtifacts,
        index: u32,
        candidate: Candidate,
    ) -> DomainResult<Attempt> {
        let request = RunnerRequest::new(&run.target, candidate.source.clone());
        artifacts
            .write_attempt_json(index, AttemptArtifact::Request, &request)
            .await?;
        artifacts.write_attempt_source(index, &candidate.source).await?;
        if let Some(confidence) = &candidate.confidence {
            artifacts
                .write_attempt_json(index, AttemptArtifact::LlmMetadata, confidence)
                .await?;
        }

        let mut metrics = AttemptMetrics {
            attempt: index,
            enhancer_duration_seconds: candidate.enhancer_duration_seconds,
            ..AttemptMetrics::default()
        }
        .with_llm_usage(candidate.confidence.as_ref());

        // Static analysis
        let static_metrics = match &self.ports.static_analyzer {
            Some(analyzer) => {
                let started = Instant::now();
                let found = analyzer.analyze(&candidate.source).await?;
                let elapsed = started.elapsed();
                run.budget.record_static_analysis(elapsed);
                metrics.static_analysis_duration_seconds = elapsed.as_secs_f64();
                artifacts
                    .write_attempt_json(index, AttemptArtifact::Static, &found)
                    .await?;
                Some(found)
            }
            None => None,
        };

        let pre = score_pre_execution(candidate.confidence.as_ref(), static_metrics.as_ref());
        artifacts
            .write_attempt_json(index, AttemptArtifact::PreReliability, &pre)
            .await?;

        // Execution
        let started = Instant::now();
        let RunnerResponse { result: response, raw } = self.ports.runner.execute(&request).await?;
        let elapsed = started.elapsed();
        run.budget.record_execution(elapsed);
        metrics.runner_duration_seconds = elapsed.as_secs_f64();
        artifacts
            .write_attempt_json(index, AttemptArtifact::Response, &raw)
            .await?;

        let targets = run.targets;
        let post = score_post_execution(&pre, &response, targets.coverage, targets.mutation);
        artifacts
            .write_attempt_json(index, AttemptArtifact::PostReliability, &post)
            .await?;

        // Critique and progress
        let coverage = response.effective_coverage();
        let critique = analyze(
            &response,
            static_metrics.as_ref(),
            &pre,
            &post,
            targets.coverage,
            targets.mutation,
        );
        let critique = update_progress(
            critique,
            coverage,
            response.mutation_score,
            &mut run.progress,
            &self.settings.progress,
        );
        artifacts
            .write_attempt_json(index, AttemptArtifact::Critique, &critique)
            .await?;
        artifacts
            .write_attempt_json(index, AttemptArtifact::Metrics, &metrics)
            .await?;

        artifacts
            .event(&format!(
                "attempt={index} state=RUN status={} cov={coverage:.2}",
                response.status
            ))
            .await?;
        info!(
            attempt = index,
            status = %response.status,
            coverage,
            mutation_score = response.mutation_score,
            pre_level = pre.level.as_str(),
            post_level = post.level.as_str(),
            instructions = critique.instructions.len(),
            "Attempt evaluated"
        );

        Ok(Attempt {
            index,
            source: candidate.source,
            request,
            confidence: candidate.confidence,
            static_metrics,
            pre_reliability: pre,
            response,
            post_reliability: post,
            critique,
            metrics,
        })
    }
}

/// Why the router stopped the loop.
fn finish_reason(critique: &Critique, index: u32, max_iterations: u32) -> FinishReason {
    if index >= max_iterations {
        FinishReason::BudgetExhausted
    } else if critique.no_progress {
        FinishReason::NoProgress
    } else {
        FinishReason::RouterFinish
    }
}
