//! Configuration management for mediagate
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use mediagate::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Max concurrent downloads: {}", config.limits.max_concurrent);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MEDIAGATE__<section>__<key>`
//!
//! Examples:
//! - `MEDIAGATE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `MEDIAGATE__LIMITS__MAX_CONCURRENT=10`
//!
//! The flat names `DOWNLOAD_DIR`, `MAX_CONCURRENT_DOWNLOADS`,
//! `MAX_DURATION_SECONDS` and `MAX_FILE_SIZE_MB` are honoured too and take
//! precedence over everything else.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/mediagate.toml`.
//! This can be overridden using the `MEDIAGATE_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, EngineConfig, LimitsConfig, ServerConfig, StorageConfig};
pub use validation::ValidationError;

use thiserror::Error;

use crate::executor::JobLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an override is malformed, or if
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Per-job limits handed to the executor
    pub fn job_limits(&self) -> JobLimits {
        JobLimits {
            max_duration_secs: self.limits.max_duration_secs,
            max_file_size_mb: self.limits.max_file_size_mb,
        }
    }
}
