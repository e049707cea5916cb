// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for connectivity operations.
*/

/// Globally unique cell identifier, assigned at placement time
pub type CellId = u64;

/// 3D position in tissue length units
pub type Position = [f64; 3];

/// Result type for connectivity operations
pub type ConnectivityResult<T> = Result<T, ConnectivityError>;

/// Errors that can occur while building connectivity
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid intersection plane '{0}' (expected one of xyz, xy, xz, yz, x, y, z)")]
    InvalidPlane(String),

    #[error("Unknown strategy kind '{0}'")]
    UnknownStrategyKind(String),

    #[error("Unknown cell type: {0}")]
    UnknownCellType(String),

    #[error("Unknown connection strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid compartment type: {0}")]
    InvalidCompartmentType(String),

    #[error("Cell type '{0}' has no morphologies to represent its cells")]
    NoMorphologies(String),

    #[error("Morphology '{0}' not found in repository")]
    MissingMorphology(String),

    #[error("Invalid synapse distribution: {0}")]
    InvalidDistribution(String),

    #[error("Incomplete connection detail: {0}")]
    IncompleteConnection(String),

    #[error("Configuration error: {0}")]
    Config(#[from] cytonet_config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<toml::de::Error> for ConnectivityError {
    fn from(err: toml::de::Error) -> Self {
        ConnectivityError::InvalidConfig(err.to_string())
    }
}
