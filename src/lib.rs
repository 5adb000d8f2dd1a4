//! covloop - coverage-driven test refinement loop
//!
//! Drives a generate → execute → critique → refine loop that improves a
//! machine-generated test module against one target file until a coverage
//! bar is met, progress stalls, or the iteration budget runs out.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and collaborator ports
//! - **Service Layer** (`services`): pure scoring, critique, progress and routing
//! - **Application Layer** (`application`): the run controller
//! - **Infrastructure Layer** (`infrastructure`): adapters, config and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use covloop::application::{RunController, RunPorts, RunSettings};
//!
//! let controller = RunController::new(ports, RunSettings::default());
//! let outcome = controller.run(target).await?;
//! println!("{}", outcome.finish_reason);
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{RunController, RunOutcome, RunPorts, RunSettings};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Attempt, Config, Critique, ExecutionResult, ExecutionStatus, FinishReason, RunSummary,
    TargetCoordinates,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{analyze, decide, score_post_execution, score_pre_execution, update_progress, Route};
