use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Environment variable consulted when no synthesizer API key is configured.
pub const API_KEY_FALLBACK_VAR: &str = "MCP_API_KEY";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid confidence_threshold: {0}. Must be between 0 and 1")]
    InvalidConfidenceThreshold(f64),

    #[error("Invalid min_pattern_frequency: {0}. Must be at least 1")]
    InvalidMinFrequency(u32),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid {0} timeout: must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Data directory cannot be empty")]
    EmptyDataDir,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .adaptest/config.yaml (project config, created by init)
    /// 3. .adaptest/local.yaml (project local overrides, optional)
    /// 4. Environment variables (ADAPTEST_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".adaptest")
    }

    /// Same hierarchy, reading the YAML layers from `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("ADAPTEST_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::apply_api_key_fallback(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::apply_api_key_fallback(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    fn apply_api_key_fallback(config: &mut Config) {
        if config.synthesizer.api_key.is_none() {
            config.synthesizer.api_key = std::env::var(API_KEY_FALLBACK_VAR)
                .ok()
                .filter(|key| !key.is_empty());
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.data_dir.trim().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        let threshold = config.learning.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(threshold));
        }

        if config.learning.min_pattern_frequency == 0 {
            return Err(ConfigError::InvalidMinFrequency(0));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.synthesizer.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.synthesizer.requests_per_second,
            ));
        }

        if config.synthesizer.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("synthesizer"));
        }
        if config.runner.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("runner"));
        }

        if config.runner.program.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "runner program cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
