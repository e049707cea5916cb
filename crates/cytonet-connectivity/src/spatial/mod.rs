// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Spatial partitioning and proximity search.

- Chunks: fixed-size cuboid partition of the volume
- Planes: axis subsets for planar intersection searches
- Radius index: uniform grid for fixed-radius neighbor queries
*/

pub mod chunk;
pub mod index;
pub mod plane;

pub use chunk::{ChunkCoord, ChunkSize};
pub use index::RadiusIndex;
pub use plane::IntersectionPlane;
