//! Context mining adapters.

pub mod python_miner;

pub use python_miner::PythonContextMiner;
