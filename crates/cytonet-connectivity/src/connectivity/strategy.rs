// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection strategy interface.

A strategy names its two hemitypes and its prerequisites, answers which
destination chunks a source chunk can reach, and produces connections for
one job's cells. Concrete kinds are built by the
[`StrategyRegistry`](super::registry::StrategyRegistry).
*/

use std::collections::BTreeSet;
use std::sync::Arc;

use cytonet_config::{HemitypeConfig, StrategyConfig};
use rand::rngs::StdRng;

use crate::events::ConnectivityObserver;
use crate::models::{
    CellType, CellTypeRegistry, CompartmentFilter, ConnectivityBatch, MorphologyRepository, PlacedCell,
    PlacementIndex,
};
use crate::spatial::{ChunkCoord, ChunkSize};
use crate::types::{ConnectivityError, ConnectivityResult, Position};

/// One side of a strategy: the cell types it targets and which of their
/// compartments take part
#[derive(Debug, Clone)]
pub struct Hemitype {
    pub cell_types: Vec<Arc<CellType>>,
    pub compartments: CompartmentFilter,
}

impl Hemitype {
    pub fn new(cell_types: Vec<Arc<CellType>>, compartments: CompartmentFilter) -> Self {
        Self {
            cell_types,
            compartments,
        }
    }

    /// Explicit cell types first, then every other type carrying a label
    pub fn resolve(config: &HemitypeConfig, registry: &CellTypeRegistry) -> ConnectivityResult<Self> {
        if !config.is_targeting_valid() {
            return Err(ConnectivityError::InvalidConfig(
                "hemitype needs at least one cell type when no labels are given".to_string(),
            ));
        }
        let mut cell_types = Vec::new();
        for name in &config.cell_types {
            let cell_type = registry.get(name)?;
            if !cell_types.iter().any(|ct: &Arc<CellType>| ct.name == cell_type.name) {
                cell_types.push(cell_type);
            }
        }
        for cell_type in registry.with_any_label(&config.labels) {
            if !cell_types.iter().any(|ct| ct.name == cell_type.name) {
                cell_types.push(cell_type);
            }
        }
        Ok(Self {
            cell_types,
            compartments: CompartmentFilter::parse(&config.compartments)?,
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.cell_types.iter().map(|ct| ct.name.as_str()).collect()
    }
}

/// Cells of one type within a job's chunk scope
#[derive(Debug, Clone)]
pub struct CellCollection {
    pub cell_type: Arc<CellType>,
    pub cells: Vec<PlacedCell>,
}

impl CellCollection {
    pub fn new(cell_type: Arc<CellType>, cells: Vec<PlacedCell>) -> Self {
        Self { cell_type, cells }
    }

    /// Cells of `cell_type` in `chunks`, in placement index order
    pub fn gather(placement: &dyn PlacementIndex, cell_type: &Arc<CellType>, chunks: &[ChunkCoord]) -> Self {
        Self::new(Arc::clone(cell_type), placement.positions(&cell_type.name, chunks))
    }

    pub fn positions(&self) -> Vec<Position> {
        self.cells.iter().map(|c| c.position).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Collaborators available to strategies during a connectivity pass
#[derive(Clone, Copy)]
pub struct ConnectivityContext<'a> {
    pub placement: &'a dyn PlacementIndex,
    pub morphologies: &'a dyn MorphologyRepository,
    pub observer: &'a dyn ConnectivityObserver,
    pub seed: Option<u64>,
}

/// Name, hemitypes and prerequisites shared by every strategy kind
#[derive(Debug, Clone)]
pub struct StrategyCore {
    pub name: String,
    pub presynaptic: Hemitype,
    pub postsynaptic: Hemitype,
    /// Names of the strategies that must complete first; always present
    pub after: Vec<String>,
    pub tag: Option<String>,
}

impl StrategyCore {
    pub fn new(name: &str, presynaptic: Hemitype, postsynaptic: Hemitype) -> Self {
        Self {
            name: name.to_string(),
            presynaptic,
            postsynaptic,
            after: Vec::new(),
            tag: None,
        }
    }

    pub fn from_config(name: &str, config: &StrategyConfig, registry: &CellTypeRegistry) -> ConnectivityResult<Self> {
        Ok(Self {
            name: name.to_string(),
            presynaptic: Hemitype::resolve(&config.presynaptic, registry)?,
            postsynaptic: Hemitype::resolve(&config.postsynaptic, registry)?,
            after: config.after.clone(),
            tag: config.tag.clone(),
        })
    }

    pub fn with_after<I, S>(mut self, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after = after.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }
}

pub trait ConnectionStrategy: Send + Sync {
    fn core(&self) -> &StrategyCore;

    /// Registry tag of the strategy kind
    fn kind(&self) -> &'static str;

    /// Destination chunks that cells in `source` may connect to
    fn region_of_interest(
        &self,
        source: ChunkCoord,
        chunk_size: ChunkSize,
        ctx: &ConnectivityContext<'_>,
    ) -> ConnectivityResult<BTreeSet<ChunkCoord>>;

    /// Connect every presynaptic collection to every postsynaptic one
    fn connect(
        &self,
        presynaptic: &[CellCollection],
        postsynaptic: &[CellCollection],
        ctx: &ConnectivityContext<'_>,
        rng: &mut StdRng,
    ) -> ConnectivityResult<Vec<ConnectivityBatch>>;

    fn name(&self) -> &str {
        &self.core().name
    }

    fn presynaptic(&self) -> &Hemitype {
        &self.core().presynaptic
    }

    fn postsynaptic(&self) -> &Hemitype {
        &self.core().postsynaptic
    }

    fn after(&self) -> &[String] {
        &self.core().after
    }

    /// Connectivity set tag for a cell-type pair
    fn tag(&self, presynaptic: &str, postsynaptic: &str) -> String {
        match &self.core().tag {
            Some(tag) => tag.clone(),
            None => format!("{}_to_{}", presynaptic, postsynaptic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CellTypeRegistry {
        let mut registry = CellTypeRegistry::new();
        registry.insert(CellType::new("granule").with_labels(["excitatory"]));
        registry.insert(CellType::new("golgi").with_labels(["inhibitory"]));
        registry.insert(CellType::new("mossy").with_labels(["excitatory"]));
        registry
    }

    #[test]
    fn test_hemitype_merges_types_and_labels() {
        let config = HemitypeConfig {
            cell_types: vec!["mossy".to_string()],
            labels: vec!["excitatory".to_string()],
            compartments: vec!["axon".to_string()],
        };
        let hemitype = Hemitype::resolve(&config, &registry()).unwrap();
        assert_eq!(hemitype.names(), vec!["mossy", "granule"]);
    }

    #[test]
    fn test_hemitype_rejects_empty_targeting() {
        let config = HemitypeConfig::default();
        assert!(matches!(
            Hemitype::resolve(&config, &registry()),
            Err(ConnectivityError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hemitype_rejects_unknown_compartment() {
        let config = HemitypeConfig {
            cell_types: vec!["golgi".to_string()],
            compartments: vec!["spine".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            Hemitype::resolve(&config, &registry()),
            Err(ConnectivityError::InvalidCompartmentType(_))
        ));
    }
}
