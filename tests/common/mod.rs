//! Common test utilities for integration tests
//!
//! Scripted collaborators implementing the domain ports, plus helpers to wire
//! a controller over an in-memory artifact store.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use covloop::application::{RunController, RunPorts, RunSettings};
use covloop::domain::errors::{DomainError, DomainResult};
use covloop::domain::models::{
    ContextPack, CoverageDetails, ExecutionResult, ExecutionStatus, GenerationConfidence,
    ProgressThresholds, RunTargets, RunnerRequest, RunnerResponse, StaticMetrics,
    TargetCoordinates, METRIC_UNAVAILABLE,
};
use covloop::domain::ports::{
    ArtifactStore, ContextMiner, EnhanceTask, GenerationOutput, GenerationRequest,
    StaticAnalyzer, TestEnhancer, TestGenerator, TestRunner,
};
use covloop::infrastructure::storage::InMemoryArtifactStore;

pub const CANDIDATE: &str = "def test_parse():\n    assert parse('a') == ['a']\n";

pub fn target() -> TargetCoordinates {
    TargetCoordinates {
        repo: "encode/httpx".to_string(),
        version: "0.27.0".to_string(),
        code_file: "httpx/_urls.py".to_string(),
    }
}

/// Runner result with the given status and figures.
pub fn result(status: ExecutionStatus, coverage: f64, mutation_score: f64) -> ExecutionResult {
    ExecutionResult {
        status,
        success: status == ExecutionStatus::Passed,
        exit_code: Some(i32::from(status != ExecutionStatus::Passed)),
        execution_time: 0.5,
        coverage,
        mutation_score,
        coverage_details: CoverageDetails::default(),
        stdout: String::new(),
        stderr: String::new(),
        test_error: String::new(),
    }
}

pub fn passed(coverage: f64) -> ExecutionResult {
    result(ExecutionStatus::Passed, coverage, METRIC_UNAVAILABLE)
}

pub fn confidence(entropy: f64, cost: f64) -> GenerationConfidence {
    GenerationConfidence {
        entropy: Some(entropy),
        avg_logprob: Some(-0.05),
        token_count: 120,
        input_tokens: 800,
        output_tokens: 120,
        estimated_cost: cost,
        duration_seconds: 0.25,
    }
}

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

/// Returns scripted results in order, repeating the last one.
pub struct ScriptedRunner {
    script: Mutex<VecDeque<DomainResult<RunnerResponse>>>,
    last: Mutex<Option<RunnerResponse>>,
    pub requests: Mutex<Vec<RunnerRequest>>,
    target_source: Option<String>,
}

impl ScriptedRunner {
    pub fn new(script: Vec<DomainResult<ExecutionResult>>) -> Self {
        Self::responses(script.into_iter().map(|r| r.map(RunnerResponse::from)).collect())
    }

    pub fn responses(script: Vec<DomainResult<RunnerResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            target_source: None,
        }
    }

    pub fn results(results: Vec<ExecutionResult>) -> Self {
        Self::new(results.into_iter().map(Ok).collect())
    }

    /// Raw service payloads, decoded the way the HTTP runner does.
    pub fn payloads(payloads: Vec<serde_json::Value>) -> Self {
        Self::responses(
            payloads
                .into_iter()
                .map(|p| RunnerResponse::from_payload(p).map_err(DomainError::from))
                .collect(),
        )
    }

    pub fn with_target_source(mut self, source: &str) -> Self {
        self.target_source = Some(source.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TestRunner for ScriptedRunner {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(&self, request: &RunnerRequest) -> DomainResult<RunnerResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(result)) => {
                *self.last.lock().unwrap() = Some(result.clone());
                Ok(result)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| DomainError::RunnerUnavailable("script exhausted".to_string())),
        }
    }

    async fn fetch_target_source(
        &self,
        _target: &TargetCoordinates,
    ) -> DomainResult<Option<String>> {
        Ok(self.target_source.clone())
    }
}

pub struct ScriptedGenerator {
    pub output: GenerationOutput,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(source: &str, confidence: Option<GenerationConfidence>) -> Self {
        Self {
            output: GenerationOutput {
                source: source.to_string(),
                confidence,
            },
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TestGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> DomainResult<GenerationOutput> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.output.clone())
    }
}

/// Appends a marker comment per call so each revision is distinct.
pub struct ScriptedEnhancer {
    pub tasks: Mutex<Vec<EnhanceTask>>,
    confidence: Option<GenerationConfidence>,
    fail: bool,
}

impl ScriptedEnhancer {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            confidence: None,
            fail: false,
        }
    }

    pub fn with_confidence(mut self, confidence: GenerationConfidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

#[async_trait]
impl TestEnhancer for ScriptedEnhancer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn enhance(&self, task: &EnhanceTask) -> DomainResult<GenerationOutput> {
        self.tasks.lock().unwrap().push(task.clone());
        if self.fail {
            return Err(DomainError::EnhancementFailed("backend unreachable".to_string()));
        }
        Ok(GenerationOutput {
            source: format!("{}# revision {}\n", task.current_source, task.attempt),
            confidence: self.confidence.clone(),
        })
    }
}

/// Returns the same metrics for every candidate.
pub struct FixedStaticAnalyzer {
    pub metrics: StaticMetrics,
}

#[async_trait]
impl StaticAnalyzer for FixedStaticAnalyzer {
    async fn analyze(&self, _source: &str) -> DomainResult<StaticMetrics> {
        Ok(self.metrics.clone())
    }
}

pub struct FixedContextMiner {
    pub pack: ContextPack,
}

impl FixedContextMiner {
    pub fn with_symbols(symbols: &[&str]) -> Self {
        Self {
            pack: ContextPack {
                summary: "URL parsing helpers.".to_string(),
                symbols: symbols.iter().map(|s| (*s).to_string()).collect(),
                docstrings: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl ContextMiner for FixedContextMiner {
    async fn mine(&self, _target_path: &Path) -> DomainResult<ContextPack> {
        Ok(self.pack.clone())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn settings(max_iterations: u32, coverage: f64, mutation: f64) -> RunSettings {
    RunSettings {
        max_iterations,
        targets: RunTargets { coverage, mutation },
        progress: ProgressThresholds::default(),
    }
}

/// Collaborators for one test, kept so assertions can inspect them.
pub struct Harness {
    pub generator: Arc<ScriptedGenerator>,
    pub enhancer: Arc<ScriptedEnhancer>,
    pub runner: Arc<ScriptedRunner>,
    pub static_analyzer: Option<Arc<FixedStaticAnalyzer>>,
    pub store: Arc<InMemoryArtifactStore>,
}

impl Harness {
    pub fn new(runner: ScriptedRunner) -> Self {
        Self {
            generator: Arc::new(ScriptedGenerator::new(CANDIDATE, None)),
            enhancer: Arc::new(ScriptedEnhancer::new()),
            runner: Arc::new(runner),
            static_analyzer: None,
            store: Arc::new(InMemoryArtifactStore::new()),
        }
    }

    pub fn generator(mut self, generator: ScriptedGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn enhancer(mut self, enhancer: ScriptedEnhancer) -> Self {
        self.enhancer = Arc::new(enhancer);
        self
    }

    pub fn static_metrics(mut self, metrics: StaticMetrics) -> Self {
        self.static_analyzer = Some(Arc::new(FixedStaticAnalyzer { metrics }));
        self
    }

    pub fn controller(&self, settings: RunSettings) -> RunController {
        let ports = RunPorts {
            generator: self.generator.clone(),
            enhancer: self.enhancer.clone(),
            runner: self.runner.clone(),
            static_analyzer: self
                .static_analyzer
                .clone()
                .map(|a| a as Arc<dyn StaticAnalyzer>),
            context_miner: Arc::new(FixedContextMiner::with_symbols(&["URL", "QueryParams"])),
            store: self.store.clone() as Arc<dyn ArtifactStore>,
        };
        RunController::new(ports, settings)
    }
}
