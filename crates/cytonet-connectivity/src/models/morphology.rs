// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Morphologies, compartments and the repository that serves them.

Compartment positions are relative to the cell soma. Compartments are
indexed `0..n` in the order the morphology declares them, and stored
connections reference those indices regardless of any type filter applied
during intersection.
*/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::cell_type::CellType;
use crate::spatial::{IntersectionPlane, RadiusIndex};
use crate::types::{ConnectivityError, ConnectivityResult, Position};

/// Kind of a compartment, following the SWC numbering for the builtin kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompartmentType {
    Soma,
    Axon,
    Dendrite,
    Custom(u16),
}

impl CompartmentType {
    pub fn from_tag(tag: u16) -> Self {
        match tag {
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::Dendrite,
            other => Self::Custom(other),
        }
    }

    pub fn tag(&self) -> u16 {
        match self {
            Self::Soma => 1,
            Self::Axon => 2,
            Self::Dendrite => 3,
            Self::Custom(tag) => *tag,
        }
    }
}

impl FromStr for CompartmentType {
    type Err = ConnectivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soma" => Ok(Self::Soma),
            "axon" => Ok(Self::Axon),
            "dendrite" | "dendrites" => Ok(Self::Dendrite),
            other => other
                .parse::<u16>()
                .map(Self::from_tag)
                .map_err(|_| ConnectivityError::InvalidCompartmentType(s.to_string())),
        }
    }
}

impl fmt::Display for CompartmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soma => f.write_str("soma"),
            Self::Axon => f.write_str("axon"),
            Self::Dendrite => f.write_str("dendrite"),
            Self::Custom(tag) => write!(f, "{}", tag),
        }
    }
}

/// Which compartment kinds take part in an intersection; empty keeps all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompartmentFilter {
    kinds: Vec<CompartmentType>,
}

impl CompartmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(kinds: Vec<CompartmentType>) -> Self {
        Self { kinds }
    }

    pub fn parse(names: &[String]) -> ConnectivityResult<Self> {
        let kinds = names
            .iter()
            .map(|name| name.parse())
            .collect::<ConnectivityResult<Vec<_>>>()?;
        Ok(Self { kinds })
    }

    pub fn matches(&self, kind: CompartmentType) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    pub fn kinds(&self) -> &[CompartmentType] {
        &self.kinds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    pub position: Position,
    pub kind: CompartmentType,
}

impl Compartment {
    pub fn new(position: Position, kind: CompartmentType) -> Self {
        Self { position, kind }
    }
}

/// Named, ordered set of compartments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    pub name: String,
    pub compartments: Vec<Compartment>,
}

impl Morphology {
    pub fn new(name: &str, compartments: Vec<Compartment>) -> Self {
        Self {
            name: name.to_string(),
            compartments,
        }
    }

    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }

    /// Indices and positions of the compartments accepted by `filter`
    pub fn filtered(&self, filter: &CompartmentFilter) -> (Vec<usize>, Vec<Position>) {
        self.compartments
            .iter()
            .enumerate()
            .filter(|(_, c)| filter.matches(c.kind))
            .map(|(i, c)| (i, c.position))
            .unzip()
    }

    /// Largest distance from the soma to any compartment
    pub fn max_extent(&self) -> f64 {
        self.compartments
            .iter()
            .map(|c| c.position.iter().map(|v| v * v).sum::<f64>().sqrt())
            .fold(0.0, f64::max)
    }
}

/// Source of morphologies by name
pub trait MorphologyRepository: Send + Sync {
    fn get_morphology(&self, name: &str) -> ConnectivityResult<Arc<Morphology>>;

    /// Morphology names able to represent a cell of `cell_type`
    fn list_morphologies(&self, cell_type: &CellType) -> Vec<String> {
        cell_type.morphologies.clone()
    }
}

/// Repository backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryMorphologyRepository {
    morphologies: AHashMap<String, Arc<Morphology>>,
}

impl MemoryMorphologyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, morphology: Morphology) {
        self.morphologies
            .insert(morphology.name.clone(), Arc::new(morphology));
    }

    pub fn len(&self) -> usize {
        self.morphologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.morphologies.is_empty()
    }
}

impl MorphologyRepository for MemoryMorphologyRepository {
    fn get_morphology(&self, name: &str) -> ConnectivityResult<Arc<Morphology>> {
        self.morphologies
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectivityError::MissingMorphology(name.to_string()))
    }
}

/// Largest [`Morphology::max_extent`] over every morphology of `cell_type`
pub fn cell_type_extent(repository: &dyn MorphologyRepository, cell_type: &CellType) -> ConnectivityResult<f64> {
    let mut extent = 0.0f64;
    for name in repository.list_morphologies(cell_type) {
        extent = extent.max(repository.get_morphology(&name)?.max_extent());
    }
    Ok(extent)
}

/// A morphology prepared for one side of an intersection
pub struct PreparedMorphology {
    pub morphology: Arc<Morphology>,
    /// Compartment index for every filtered position
    pub compartments: Vec<usize>,
    pub positions: Vec<Position>,
    index: OnceCell<RadiusIndex>,
    radius: f64,
    plane: IntersectionPlane,
}

impl PreparedMorphology {
    pub fn name(&self) -> &str {
        &self.morphology.name
    }

    /// Radius index over the filtered positions, built on first use
    pub fn index(&self) -> &RadiusIndex {
        self.index
            .get_or_init(|| RadiusIndex::new(&self.positions, self.radius, self.plane))
    }
}

/// Per-call morphology cache for one side of a cell-type pair
///
/// Each name is fetched from the repository and filtered once; repeated
/// picks share the same [`PreparedMorphology`].
pub struct MorphologyCache<'a> {
    repository: &'a dyn MorphologyRepository,
    filter: CompartmentFilter,
    radius: f64,
    plane: IntersectionPlane,
    prepared: AHashMap<String, Arc<PreparedMorphology>>,
}

impl<'a> MorphologyCache<'a> {
    pub fn new(
        repository: &'a dyn MorphologyRepository,
        filter: CompartmentFilter,
        radius: f64,
        plane: IntersectionPlane,
    ) -> Self {
        Self {
            repository,
            filter,
            radius,
            plane,
            prepared: AHashMap::new(),
        }
    }

    pub fn get(&mut self, name: &str) -> ConnectivityResult<Arc<PreparedMorphology>> {
        if let Some(prepared) = self.prepared.get(name) {
            return Ok(Arc::clone(prepared));
        }
        let morphology = self.repository.get_morphology(name)?;
        let (compartments, positions) = morphology.filtered(&self.filter);
        let prepared = Arc::new(PreparedMorphology {
            morphology,
            compartments,
            positions,
            index: OnceCell::new(),
            radius: self.radius,
            plane: self.plane,
        });
        self.prepared.insert(name.to_string(), Arc::clone(&prepared));
        Ok(prepared)
    }

    pub fn len(&self) -> usize {
        self.prepared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prepared.is_empty()
    }
}
