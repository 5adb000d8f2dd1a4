//! Figment-based settings loader and validation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Coverage target outside 0..=100.
    #[error("Invalid coverage target: {0}. Must be between 0 and 100")]
    InvalidCoverageTarget(f64),

    /// Mutation target outside 0..=100.
    #[error("Invalid mutation target: {0}. Must be between 0 and 100")]
    InvalidMutationTarget(f64),

    /// Stagnation limit of zero.
    #[error("Invalid stagnation_limit: {0}. Must be at least 1")]
    InvalidStagnationLimit(u32),

    /// Negative progress threshold.
    #[error("Invalid progress threshold {name}: {value}. Must be non-negative")]
    InvalidProgressThreshold { name: &'static str, value: f64 },

    /// Unknown log level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown log format.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown rotation policy.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    /// Empty artifacts root.
    #[error("Artifacts root cannot be empty")]
    EmptyArtifactsRoot,

    /// Runner URL missing outside dry-run mode.
    #[error("Runner URL cannot be empty unless dry_run is enabled")]
    EmptyRunnerUrl,

    /// Extraction or merge failure.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Project config file, relative to the working directory
    pub const PROJECT_CONFIG: &'static str = ".covloop/config.yaml";
    /// Uncommitted local overrides
    pub const LOCAL_CONFIG: &'static str = ".covloop/local.yaml";
    /// Environment variable prefix; nesting uses `__`
    pub const ENV_PREFIX: &'static str = "COVLOOP_";

    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .covloop/config.yaml
    /// 3. .covloop/local.yaml
    /// 4. Explicit `--config` file, if given
    /// 5. Environment variables (COVLOOP_* prefix)
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(explicit)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without project files or env
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(Self::PROJECT_CONFIG))
            .merge(Yaml::file(Self::LOCAL_CONFIG));

        if let Some(path) = explicit {
            figment = figment.merge(Yaml::file(PathBuf::from(path)));
        }

        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let in_percent_range = |v: f64| (0.0..=100.0).contains(&v);

        if !in_percent_range(config.targets.coverage) {
            return Err(ConfigError::InvalidCoverageTarget(config.targets.coverage));
        }
        if !in_percent_range(config.targets.mutation) {
            return Err(ConfigError::InvalidMutationTarget(config.targets.mutation));
        }

        // Progress thresholds
        if config.progress.stagnation_limit == 0 {
            return Err(ConfigError::InvalidStagnationLimit(
                config.progress.stagnation_limit,
            ));
        }
        for (name, value) in [
            ("min_coverage_gain", config.progress.min_coverage_gain),
            ("min_mutation_gain", config.progress.min_mutation_gain),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidProgressThreshold { name, value });
            }
        }

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.artifacts.root.trim().is_empty() {
            return Err(ConfigError::EmptyArtifactsRoot);
        }

        if config.runner.url.trim().is_empty() && !config.runner.dry_run {
            return Err(ConfigError::EmptyRunnerUrl);
        }

        // Lint tools
        for tool in &config.static_analysis.lint_tools {
            if tool.name.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Lint tool name cannot be empty".to_string(),
                ));
            }
            if tool.program.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Lint tool '{}' program cannot be empty",
                    tool.name
                )));
            }
        }

        Ok(())
    }
}
