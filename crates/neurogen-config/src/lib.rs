// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neurogen Configuration System
//!
//! Type-safe configuration for the growth simulation with support for:
//! - TOML file parsing
//! - Environment variable overrides (`NEUROGEN_<KEY>`)
//! - Flat `key=value` parameter files and overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neurogen_config::{load_config, validate_config, ParameterStore};
//!
//! let parameters = ParameterStore::parse("neurons_per_cluster = 16").unwrap();
//! let config = load_config(None, Some(&parameters)).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Clusters: {}", config.population.cluster_count);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod parameters;
pub mod types;
pub mod validation;

pub use loader::{
    apply_environment_overrides, environment_parameters, find_config_file, load_config,
    CONFIG_FILE_NAME,
};
pub use parameters::{ParameterError, ParameterStore};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
