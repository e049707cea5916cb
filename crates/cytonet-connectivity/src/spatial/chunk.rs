// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Spatial partition of the tissue volume into axis-aligned cuboid chunks.

A chunk `(x, y, z)` with size `s` spans `[x*s.x, (x+1)*s.x)` on the x axis,
and likewise for y and z.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use super::plane::IntersectionPlane;
use crate::types::Position;

/// Edge lengths of a chunk along x, y and z
pub type ChunkSize = [f64; 3];

/// Integer address of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk that contains `position`
    pub fn containing(position: Position, chunk_size: ChunkSize) -> Self {
        let axis = |i: usize| (position[i] / chunk_size[i]).floor() as i32;
        Self::new(axis(0), axis(1), axis(2))
    }

    pub fn as_array(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Lower corner of the chunk in tissue coordinates
    pub fn origin(&self, chunk_size: ChunkSize) -> Position {
        let c = self.as_array();
        [
            c[0] as f64 * chunk_size[0],
            c[1] as f64 * chunk_size[1],
            c[2] as f64 * chunk_size[2],
        ]
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Smallest distance between any point of `self` and any point of
    /// `other`, measured only along the axes of `plane`.
    ///
    /// Adjacent chunks (sharing a face, edge or corner) are at distance 0.
    pub fn box_distance(&self, other: &ChunkCoord, chunk_size: ChunkSize, plane: IntersectionPlane) -> f64 {
        let a = self.as_array();
        let b = other.as_array();
        plane
            .axes()
            .iter()
            .map(|&axis| {
                let steps = (a[axis] - b[axis]).unsigned_abs().saturating_sub(1) as f64;
                let gap = steps * chunk_size[axis];
                gap * gap
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}
