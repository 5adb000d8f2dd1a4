//! Infrastructure layer module
//!
//! Adapters and external integrations:
//! - Configuration loading (figment)
//! - Logging (tracing)
//! - Artifact storage
//! - Runner clients (HTTP, dry-run)
//! - Static analysis (tree-sitter, lint subprocesses)
//! - Context mining
//! - Generation backends
//!
//! Implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod context;
pub mod llm;
pub mod logging;
pub mod runner;
pub mod static_analysis;
pub mod storage;
