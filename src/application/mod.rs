//! Application layer: orchestration over the domain ports.

pub mod run_controller;

pub use run_controller::{RunController, RunOutcome, RunPorts, RunSettings};
