// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # cytonet configuration
//!
//! Type-safe loader for network definitions: cell types, connection
//! strategies and simulation settings.
//!
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//! - Structural validation (references, hemitype rules, `after` cycles)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cytonet_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid network");
//! println!("Chunk size: {:?}", config.simulation.chunk_size);
//! ```
//!
//! Strategy specific options are kept as a raw table here; the connectivity
//! registry deserializes them into the typed record of each strategy kind.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    parse_config,
};
pub use types::*;
pub use validation::{dependency_order, validate_config, ConfigValidationError};

/// Re-export for convenience
pub use serde;
pub use toml;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Dependency cycle between connection strategies: {0}")]
    DependencyCycle(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
