// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region-of-interest resolution.

A destination chunk is in the region of a source chunk when the smallest
distance between the two boxes, measured along the axes of the projection
plane, does not exceed the reach. Reach at or below the chunk size thus
yields the source chunk and its face, edge and corner neighbours.
*/

use std::collections::BTreeSet;

use crate::spatial::{ChunkCoord, ChunkSize, IntersectionPlane};

/// Destination chunks among `candidates` reachable from `source`
pub fn chunks_within_reach(
    source: ChunkCoord,
    chunk_size: ChunkSize,
    reach: f64,
    plane: IntersectionPlane,
    candidates: &BTreeSet<ChunkCoord>,
) -> BTreeSet<ChunkCoord> {
    if reach.is_nan() || reach < 0.0 {
        return BTreeSet::new();
    }
    if reach.is_infinite() {
        return candidates.clone();
    }
    match box_steps(chunk_size, reach, plane) {
        Some(steps) if box_volume(&steps) <= candidates.len() as f64 => {
            enumerate_box(source, chunk_size, reach, plane, &steps, candidates)
        }
        _ => scan(source, chunk_size, reach, plane, candidates),
    }
}

/// Largest per-axis chunk offset that can still be within reach. `None`
/// when some axis is unbounded (outside the plane).
fn box_steps(chunk_size: ChunkSize, reach: f64, plane: IntersectionPlane) -> Option<[i32; 3]> {
    if plane != IntersectionPlane::Xyz {
        return None;
    }
    let mut steps = [0i32; 3];
    for axis in 0..3 {
        let s = (reach / chunk_size[axis]).floor() + 1.0;
        if !s.is_finite() || s > i32::MAX as f64 / 4.0 {
            return None;
        }
        steps[axis] = s as i32;
    }
    Some(steps)
}

fn box_volume(steps: &[i32; 3]) -> f64 {
    steps.iter().map(|&s| 2.0 * s as f64 + 1.0).product()
}

fn enumerate_box(
    source: ChunkCoord,
    chunk_size: ChunkSize,
    reach: f64,
    plane: IntersectionPlane,
    steps: &[i32; 3],
    candidates: &BTreeSet<ChunkCoord>,
) -> BTreeSet<ChunkCoord> {
    let mut region = BTreeSet::new();
    for dx in -steps[0]..=steps[0] {
        for dy in -steps[1]..=steps[1] {
            for dz in -steps[2]..=steps[2] {
                let chunk = source.offset(dx, dy, dz);
                if candidates.contains(&chunk) && source.box_distance(&chunk, chunk_size, plane) <= reach {
                    region.insert(chunk);
                }
            }
        }
    }
    region
}

fn scan(
    source: ChunkCoord,
    chunk_size: ChunkSize,
    reach: f64,
    plane: IntersectionPlane,
    candidates: &BTreeSet<ChunkCoord>,
) -> BTreeSet<ChunkCoord> {
    candidates
        .iter()
        .filter(|chunk| source.box_distance(chunk, chunk_size, plane) <= reach)
        .copied()
        .collect()
}
