//! Layered covloop settings.
//!
//! Defaults, then `.covloop/config.yaml`, `.covloop/local.yaml`, an explicit
//! file, and finally `COVLOOP_*` environment variables. The merged result is
//! validated before use.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
