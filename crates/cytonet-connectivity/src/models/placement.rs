// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Placement index: where the cells of each type were put.

Placement itself happens before connectivity; this module only exposes the
lookups connectivity needs, plus an in-memory index that assigns ids the
way the placement phase does (globally unique, monotonically increasing).
*/

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::spatial::{ChunkCoord, ChunkSize};
use crate::types::{CellId, Position};

/// A placed cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedCell {
    pub id: CellId,
    pub position: Position,
}

/// Read access to placement data during a connectivity pass
pub trait PlacementIndex: Send + Sync {
    /// Chunks holding at least one cell of `cell_type`
    fn chunks(&self, cell_type: &str) -> BTreeSet<ChunkCoord>;

    /// Cells of `cell_type` placed in any of `chunks`.
    ///
    /// Ordering is stable for the same arguments: chunks in ascending order,
    /// cells within a chunk in placement order. Duplicate chunks are ignored.
    fn positions(&self, cell_type: &str, chunks: &[ChunkCoord]) -> Vec<PlacedCell>;

    /// Every chunk populated by any of `cell_types`
    fn populated_chunks(&self, cell_types: &[&str]) -> BTreeSet<ChunkCoord> {
        cell_types
            .iter()
            .flat_map(|ct| self.chunks(ct))
            .collect()
    }
}

/// Placement index held in memory
#[derive(Debug, Clone)]
pub struct MemoryPlacementIndex {
    chunk_size: ChunkSize,
    next_id: CellId,
    sets: AHashMap<String, BTreeMap<ChunkCoord, Vec<PlacedCell>>>,
}

impl MemoryPlacementIndex {
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self {
            chunk_size,
            next_id: 0,
            sets: AHashMap::new(),
        }
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Place cells of `cell_type` and return their newly assigned ids
    pub fn place(&mut self, cell_type: &str, positions: &[Position]) -> Vec<CellId> {
        let set = self.sets.entry(cell_type.to_string()).or_default();
        let mut ids = Vec::with_capacity(positions.len());
        for &position in positions {
            let id = self.next_id;
            self.next_id += 1;
            set.entry(ChunkCoord::containing(position, self.chunk_size))
                .or_default()
                .push(PlacedCell { id, position });
            ids.push(id);
        }
        ids
    }

    /// Number of cells placed for `cell_type`
    pub fn count(&self, cell_type: &str) -> usize {
        self.sets
            .get(cell_type)
            .map(|set| set.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn total_cells(&self) -> usize {
        self.next_id as usize
    }
}

impl PlacementIndex for MemoryPlacementIndex {
    fn chunks(&self, cell_type: &str) -> BTreeSet<ChunkCoord> {
        self.sets
            .get(cell_type)
            .map(|set| set.keys().copied().collect())
            .unwrap_or_default()
    }

    fn positions(&self, cell_type: &str, chunks: &[ChunkCoord]) -> Vec<PlacedCell> {
        let Some(set) = self.sets.get(cell_type) else {
            return Vec::new();
        };
        let wanted: BTreeSet<ChunkCoord> = chunks.iter().copied().collect();
        wanted
            .iter()
            .filter_map(|chunk| set.get(chunk))
            .flat_map(|cells| cells.iter().copied())
            .collect()
    }
}
