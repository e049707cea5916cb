// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cytonet - synaptic connectivity for placed neuron populations
//!
//! Cytonet takes cells that have already been placed in a tissue volume and
//! connects them. The volume is split into chunks; each connection strategy
//! becomes one job per destination chunk, and jobs run in parallel while
//! respecting the order declared between strategies.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! cytonet = "0.1"
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): run independent jobs on the rayon pool
//! - **`file-logging`**: per-crate JSON log files with retention
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cytonet::prelude::*;
//!
//! let config = cytonet::config::load_config(None, None)?;
//! let _logging = cytonet::observability::init_logging(
//!     &cytonet::observability::parse_debug_flags(),
//!     config.simulation.verbosity,
//!     &cytonet::observability::LoggingConfig::default(),
//! )?;
//!
//! let mut placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
//! placement.place("granule", &[[10.0, 20.0, 5.0]]);
//! let morphologies = MemoryMorphologyRepository::new();
//! let sink = MemoryConnectivitySink::new();
//!
//! let report = ConnectivityPipeline::new(config).run(&placement, &morphologies, &sink)?;
//! println!("{} connections", report.connections());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: cytonet-config, cytonet-observability      │
//! │  (Network definition, logging)                          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: cytonet-connectivity                       │
//! │  (Scheduling, intersection, synapse sampling)           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use cytonet_config as config;
pub use cytonet_connectivity as connectivity;
pub use cytonet_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{NetworkConfig, StrategyConfig};
    pub use crate::connectivity::{
        CellType, ChunkCoord, ConnectionStrategy, ConnectivityPipeline, ConnectivityReport, ConnectivitySet,
        ConnectivitySink, IntersectionPlane, MemoryConnectivitySink, MemoryMorphologyRepository,
        MemoryPlacementIndex, Morphology, MorphologyRepository, PlacementIndex, StrategyRegistry,
    };
}
