// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Cytonet Connectivity

Builds synaptic connectivity between placed cell populations:
- Chunked job scheduling with inter-strategy dependencies
- Region-of-interest resolution across chunk boundaries
- Touch detection (soma candidates, compartment touches, synapse sampling)

## Architecture

- `spatial`: chunks, projection planes, radius index
- `models`: cell types, morphologies, placement, connections and sinks
- `connectivity`: strategies, scheduler, intersectors, synapse sampler
- `jobs`: job pool interface and the local wave-based pool
- `pipeline`: end-to-end orchestration from a network definition

## Example

```no_run
use cytonet_config::load_config;
use cytonet_connectivity::{
    ConnectivityPipeline, MemoryConnectivitySink, MemoryMorphologyRepository, MemoryPlacementIndex,
};

let config = load_config(None, None)?;
let placement = MemoryPlacementIndex::new(config.simulation.chunk_size);
let morphologies = MemoryMorphologyRepository::new();
let sink = MemoryConnectivitySink::new();

let report = ConnectivityPipeline::new(config).run(&placement, &morphologies, &sink)?;
println!("{} connections", report.connections());
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connectivity;
pub mod events;
pub mod jobs;
pub mod models;
pub mod pipeline;
mod rng;
pub mod spatial;
pub mod types;

pub use connectivity::{
    chunks_within_reach, intersect_cells, intersect_compartments, AllToAll, CellCollection,
    ConnectionStrategy, ConnectivityContext, ConnectivityScheduler, Hemitype, StrategyCore,
    StrategyRegistry, SynapseDistribution, SynapseSampler, TouchDetector, TouchDetectorParams,
};
pub use events::{ConnectivityEvent, ConnectivityObserver, NullObserver, RecordingObserver, TracingObserver};
pub use jobs::{ConnectivityJob, ExecutionReport, JobHandle, JobPool, JobStatus, LocalJobPool};
pub use models::{
    CellType, CellTypeRegistry, Compartment, CompartmentDetail, CompartmentFilter, CompartmentType,
    Connection, ConnectivityBatch, ConnectivitySet, ConnectivitySink, MemoryConnectivitySink,
    MemoryMorphologyRepository, MemoryPlacementIndex, Morphology, MorphologyRepository, PlacedCell,
    PlacementIndex,
};
pub use pipeline::{ConnectivityPipeline, ConnectivityReport, PipelineProgress, PipelineStage};
pub use spatial::{ChunkCoord, ChunkSize, IntersectionPlane, RadiusIndex};
pub use types::{CellId, ConnectivityError, ConnectivityResult, Position};
