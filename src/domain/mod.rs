//! Domain layer for the covloop refinement system
//!
//! Core models, error types and the ports that external collaborators
//! (generator, enhancer, runner, static analyzer, context miner, artifact
//! store) implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
