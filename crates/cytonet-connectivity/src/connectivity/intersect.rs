// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Cell and compartment intersection.

The cell-level pass finds candidate pairs by soma distance. The
compartment-level pass then checks, for each candidate pair, which
compartments actually come within the compartment radius of each other.
*/

use crate::models::PreparedMorphology;
use crate::spatial::{IntersectionPlane, RadiusIndex};
use crate::types::Position;

/// For every destination cell, the sorted indices of candidate source cells
pub type CandidateMap = Vec<Vec<usize>>;

/// Which population is put in the index; the other one is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySide {
    /// Index sources, query once per destination
    Destinations,
    /// Index destinations, query once per source, then invert
    Sources,
}

impl QuerySide {
    /// Query from the smaller population
    pub fn cheapest(sources: usize, destinations: usize) -> Self {
        if sources < destinations {
            Self::Sources
        } else {
            Self::Destinations
        }
    }
}

/// Candidate source cells within `radius` of each destination cell
pub fn intersect_cells(
    sources: &[Position],
    destinations: &[Position],
    radius: f64,
    plane: IntersectionPlane,
) -> CandidateMap {
    let side = QuerySide::cheapest(sources.len(), destinations.len());
    intersect_cells_from(sources, destinations, radius, plane, side)
}

/// [`intersect_cells`] with an explicit query side
pub fn intersect_cells_from(
    sources: &[Position],
    destinations: &[Position],
    radius: f64,
    plane: IntersectionPlane,
    side: QuerySide,
) -> CandidateMap {
    match side {
        QuerySide::Destinations => RadiusIndex::new(sources, radius, plane).query_many(destinations),
        QuerySide::Sources => {
            let index = RadiusIndex::new(destinations, radius, plane);
            let mut candidates: CandidateMap = vec![Vec::new(); destinations.len()];
            // Sources are visited in ascending order, so every list stays sorted
            for (source, position) in sources.iter().enumerate() {
                index.for_each_within(*position, |destination| candidates[destination].push(source));
            }
            candidates
        }
    }
}

/// Touching `(source compartment, destination compartment)` pairs of two
/// cells, in morphology compartment indices.
///
/// Destination compartments are moved into the source cell's frame and
/// queried against the source morphology's compartment index.
pub fn intersect_compartments(
    source: &PreparedMorphology,
    source_position: Position,
    destination: &PreparedMorphology,
    destination_position: Position,
) -> Vec<(usize, usize)> {
    let offset = [
        destination_position[0] - source_position[0],
        destination_position[1] - source_position[1],
        destination_position[2] - source_position[2],
    ];
    let index = source.index();
    let mut pairs = Vec::new();
    for (i, position) in destination.positions.iter().enumerate() {
        let query = [
            position[0] + offset[0],
            position[1] + offset[1],
            position[2] + offset[2],
        ];
        for hit in index.query(query) {
            pairs.push((source.compartments[hit], destination.compartments[i]));
        }
    }
    pairs
}
