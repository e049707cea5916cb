// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection strategies and the machinery that runs them.

- **Strategy**: the interface every connection kind implements
- **ROI**: destination chunks reachable from a source chunk
- **Scheduler**: one job per (strategy, destination chunk), with
  prerequisite jobs as dependencies
- **Intersect**: soma-level candidates, compartment-level touches
- **Synapses**: synapse count distributions and sampling
- **Registry**: strategy kind → constructor
*/

pub mod all_to_all;
pub mod intersect;
pub mod registry;
pub mod roi;
pub mod scheduler;
pub mod strategy;
pub mod synapses;
pub mod touch_detector;

pub use all_to_all::AllToAll;
pub use intersect::{intersect_cells, intersect_cells_from, intersect_compartments, CandidateMap, QuerySide};
pub use registry::{StrategyBuilder, StrategyRegistry};
pub use roi::chunks_within_reach;
pub use scheduler::{order_strategies, plan_jobs, ConnectivityScheduler, JobPlan};
pub use strategy::{CellCollection, ConnectionStrategy, ConnectivityContext, Hemitype, StrategyCore};
pub use synapses::{SynapseDistribution, SynapseSampler};
pub use touch_detector::{TouchDetector, TouchDetectorParams};
