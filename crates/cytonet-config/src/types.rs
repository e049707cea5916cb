// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! These structs map to the sections of a network definition file
//! (`cytonet.toml`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub simulation: SimulationConfig,
    pub cell_types: BTreeMap<String, CellTypeConfig>,
    pub connectivity: BTreeMap<String, StrategyConfig>,
}

/// Volume partitioning and run settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Edge lengths of one chunk along x, y and z
    pub chunk_size: [f64; 3],
    /// Seed for repeatable connectivity; `None` draws from entropy
    pub seed: Option<u64>,
    /// 0 = quiet, 1 = job progress, 2 = per cell-type pair statistics
    pub verbosity: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chunk_size: [100.0, 100.0, 100.0],
            seed: None,
            verbosity: 1,
        }
    }
}

/// A cell type as seen by the connectivity phase
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CellTypeConfig {
    /// Relay cell types pass connections through without own morphology
    pub relay: bool,
    /// Labels that hemitypes can target instead of naming the type
    pub labels: Vec<String>,
    /// Names of the morphologies that can represent a cell of this type
    pub morphologies: Vec<String>,
}

/// One side (pre- or postsynaptic) of a connection strategy
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HemitypeConfig {
    pub cell_types: Vec<String>,
    pub labels: Vec<String>,
    /// Compartment kinds to consider (`soma`, `dendrite`, `axon`, or a
    /// numeric tag). Empty selects every compartment.
    pub compartments: Vec<String>,
}

impl HemitypeConfig {
    /// Without a label filter at least one cell type must be named
    pub fn is_targeting_valid(&self) -> bool {
        !self.labels.is_empty() || !self.cell_types.is_empty()
    }
}

/// Declarative definition of one connection strategy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Registry tag of the strategy kind, e.g. `touch_detector`
    pub strategy: String,
    pub presynaptic: HemitypeConfig,
    pub postsynaptic: HemitypeConfig,
    /// Strategies that must finish before this one starts
    #[serde(default)]
    pub after: Vec<String>,
    /// Overrides the `<pre>_to_<post>` connectivity set tag
    #[serde(default)]
    pub tag: Option<String>,
    /// Remaining, strategy specific options
    #[serde(flatten)]
    pub parameters: toml::Table,
}

impl StrategyConfig {
    pub fn new(strategy: &str, presynaptic: HemitypeConfig, postsynaptic: HemitypeConfig) -> Self {
        Self {
            strategy: strategy.to_string(),
            presynaptic,
            postsynaptic,
            after: Vec::new(),
            tag: None,
            parameters: toml::Table::new(),
        }
    }
}
