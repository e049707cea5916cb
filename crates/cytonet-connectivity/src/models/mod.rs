// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Data model of the connectivity phase.

- Cell types and their registry
- Morphologies, compartments and the morphology repository
- Placement index (cells per type and chunk)
- Connections, connectivity sets and the sink
*/

pub mod cell_type;
pub mod connection;
pub mod morphology;
pub mod placement;

pub use cell_type::{CellType, CellTypeRegistry};
pub use connection::{
    CompartmentDetail, Connection, ConnectivityBatch, ConnectivityMetadata, ConnectivitySet,
    ConnectivitySink, MemoryConnectivitySink,
};
pub use morphology::{
    cell_type_extent, Compartment, CompartmentFilter, CompartmentType, MemoryMorphologyRepository,
    Morphology, MorphologyCache, MorphologyRepository, PreparedMorphology,
};
pub use placement::{MemoryPlacementIndex, PlacedCell, PlacementIndex};
