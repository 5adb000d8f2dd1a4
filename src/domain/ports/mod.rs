//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - TestGenerator: produces attempt 0
//! - TestEnhancer: revises a candidate from critique instructions
//! - TestRunner: executes a candidate and reports coverage
//! - StaticAnalyzer: syntax, structure and lint findings
//! - ContextMiner: symbols and docstrings from the target
//! - ArtifactStore: per-run persistence

pub mod artifact_store;
pub mod context_miner;
pub mod enhancer;
pub mod generator;
pub mod runner;
pub mod static_analyzer;

pub use artifact_store::ArtifactStore;
pub use context_miner::ContextMiner;
pub use enhancer::{EnhanceTask, TestEnhancer};
pub use generator::{GenerationOutput, GenerationRequest, TestGenerator};
pub use runner::TestRunner;
pub use static_analyzer::StaticAnalyzer;
