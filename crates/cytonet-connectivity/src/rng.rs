// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Random sources for connectivity jobs.

With a seed, every job derives its own generator from the seed, the
strategy name and the target chunk, so results do not depend on the order
in which workers pick jobs up. Without a seed the generator draws from
entropy.
*/

use rand::rngs::StdRng;
use rand::SeedableRng;
use xxhash_rust::xxh64::xxh64;

use crate::spatial::ChunkCoord;

/// Generator for the job of `strategy` on `chunk`
pub fn job_rng(seed: Option<u64>, strategy: &str, chunk: ChunkCoord) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(job_seed(seed, strategy, chunk)),
        None => StdRng::from_entropy(),
    }
}

/// Stable per-job seed
pub fn job_seed(seed: u64, strategy: &str, chunk: ChunkCoord) -> u64 {
    let mut key = Vec::with_capacity(strategy.len() + 12);
    key.extend_from_slice(strategy.as_bytes());
    for axis in chunk.as_array() {
        key.extend_from_slice(&axis.to_le_bytes());
    }
    xxh64(&key, seed)
}
