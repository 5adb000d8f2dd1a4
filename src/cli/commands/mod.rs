//! CLI command implementations.

pub mod batch;
pub mod run;
pub mod show;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::{RunController, RunPorts, RunSettings};
use crate::domain::models::Config;
use crate::domain::ports::{ArtifactStore, StaticAnalyzer};
use crate::infrastructure::context::PythonContextMiner;
use crate::infrastructure::llm::{build_enhancer, build_generator};
use crate::infrastructure::runner::build_runner;
use crate::infrastructure::static_analysis::PythonStaticAnalyzer;
use crate::infrastructure::storage::FileArtifactStore;

/// Artifact store rooted at the configured directory.
pub fn artifact_store(config: &Config) -> Arc<dyn ArtifactStore> {
    Arc::new(FileArtifactStore::new(&config.artifacts.root))
}

/// Wire a controller from configuration.
pub fn build_controller(
    config: &Config,
    settings: RunSettings,
    repo_root: &Path,
    store: Arc<dyn ArtifactStore>,
) -> Result<RunController> {
    let runner = build_runner(&config.runner).context("Failed to configure runner")?;
    let static_analyzer: Option<Arc<dyn StaticAnalyzer>> = config
        .static_analysis
        .enabled
        .then(|| Arc::new(PythonStaticAnalyzer::new(&config.static_analysis)) as Arc<dyn StaticAnalyzer>);

    let ports = RunPorts {
        generator: build_generator(&config.llm),
        enhancer: build_enhancer(&config.llm),
        runner,
        static_analyzer,
        context_miner: Arc::new(PythonContextMiner::new(repo_root)),
        store,
    };
    Ok(RunController::new(ports, settings))
}
