// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Touch detection: connect cells whose compartments come close enough.

For each pair of pre- and postsynaptic cell types:

1. Candidate cell pairs are found by soma distance, using either the
   configured `cell_intersection_radius` or the sum of both types' extents.
2. Each cell involved in a candidate pair gets a morphology, drawn
   uniformly from its type's morphologies.
3. Touching compartment pairs are found within
   `compartment_intersection_radius`.
4. A synapse count is drawn and that many distinct touching pairs become
   synapses.
*/

use std::collections::BTreeSet;
use std::sync::Arc;

use cytonet_config::StrategyConfig;
use ahash::AHashMap;
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, trace};

use super::intersect::{intersect_cells, intersect_compartments};
use super::roi::chunks_within_reach;
use super::strategy::{CellCollection, ConnectionStrategy, ConnectivityContext, Hemitype, StrategyCore};
use super::synapses::{SynapseDistribution, SynapseSampler};
use crate::events::ConnectivityEvent;
use crate::models::{
    cell_type_extent, CellType, CellTypeRegistry, CompartmentDetail, Connection, ConnectivityBatch,
    MorphologyCache, MorphologyRepository, PreparedMorphology,
};
use crate::spatial::{ChunkCoord, ChunkSize, IntersectionPlane};
use crate::types::{ConnectivityError, ConnectivityResult};

pub const KIND: &str = "touch_detector";

fn default_compartment_radius() -> f64 {
    5.0
}

/// Options of a touch detector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TouchDetectorParams {
    pub cell_intersection_plane: IntersectionPlane,
    pub compartment_intersection_plane: IntersectionPlane,
    /// Soma search radius; derived from morphology extents when unset
    pub cell_intersection_radius: Option<f64>,
    #[serde(default = "default_compartment_radius")]
    pub compartment_intersection_radius: f64,
    pub synapses: SynapseDistribution,
    pub allow_zero_synapses: bool,
}

impl Default for TouchDetectorParams {
    fn default() -> Self {
        Self {
            cell_intersection_plane: IntersectionPlane::Xyz,
            compartment_intersection_plane: IntersectionPlane::Xyz,
            cell_intersection_radius: None,
            compartment_intersection_radius: default_compartment_radius(),
            synapses: SynapseDistribution::default(),
            allow_zero_synapses: false,
        }
    }
}

impl TouchDetectorParams {
    pub fn validate(&self) -> ConnectivityResult<()> {
        if let Some(radius) = self.cell_intersection_radius {
            if !(radius >= 0.0) {
                return Err(ConnectivityError::InvalidConfig(format!(
                    "cell_intersection_radius must be non-negative, got {}",
                    radius
                )));
            }
        }
        if !(self.compartment_intersection_radius >= 0.0) || self.compartment_intersection_radius.is_infinite() {
            return Err(ConnectivityError::InvalidConfig(format!(
                "compartment_intersection_radius must be a non-negative number, got {}",
                self.compartment_intersection_radius
            )));
        }
        self.synapses.validate()
    }
}

/// Counters for one cell-type pair
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TouchCounts {
    checked: usize,
    touching: usize,
    synapses: usize,
}

pub struct TouchDetector {
    core: StrategyCore,
    params: TouchDetectorParams,
    sampler: SynapseSampler,
    reach: OnceCell<f64>,
    /// Extent of every targeted cell type, loaded on first use
    extents: AHashMap<String, OnceCell<f64>>,
}

impl TouchDetector {
    pub fn new(core: StrategyCore, params: TouchDetectorParams) -> ConnectivityResult<Self> {
        params.validate()?;
        let sampler = SynapseSampler::new(&params.synapses, params.allow_zero_synapses)?;
        let extents = core
            .presynaptic
            .cell_types
            .iter()
            .chain(&core.postsynaptic.cell_types)
            .map(|ct| (ct.name.clone(), OnceCell::new()))
            .collect();
        Ok(Self {
            core,
            params,
            sampler,
            reach: OnceCell::new(),
            extents,
        })
    }

    pub fn from_config(
        name: &str,
        config: &StrategyConfig,
        cell_types: &CellTypeRegistry,
    ) -> ConnectivityResult<Arc<dyn ConnectionStrategy>> {
        let core = StrategyCore::from_config(name, config, cell_types)?;
        let params: TouchDetectorParams = toml::Value::Table(config.parameters.clone()).try_into()?;
        Ok(Arc::new(Self::new(core, params)?))
    }

    pub fn params(&self) -> &TouchDetectorParams {
        &self.params
    }

    /// Largest soma distance at which any pair of this strategy can touch
    pub fn reach(&self, morphologies: &dyn MorphologyRepository) -> ConnectivityResult<f64> {
        self.reach
            .get_or_try_init(|| match self.params.cell_intersection_radius {
                Some(radius) => Ok(radius),
                None => Ok(self.max_extent(morphologies, &self.core.presynaptic)?
                    + self.max_extent(morphologies, &self.core.postsynaptic)?),
            })
            .copied()
    }

    fn extent(&self, morphologies: &dyn MorphologyRepository, cell_type: &CellType) -> ConnectivityResult<f64> {
        match self.extents.get(&cell_type.name) {
            Some(extent) => extent
                .get_or_try_init(|| cell_type_extent(morphologies, cell_type))
                .copied(),
            None => cell_type_extent(morphologies, cell_type),
        }
    }

    fn max_extent(&self, morphologies: &dyn MorphologyRepository, hemitype: &Hemitype) -> ConnectivityResult<f64> {
        let mut extent = 0.0f64;
        for cell_type in &hemitype.cell_types {
            extent = extent.max(self.extent(morphologies, cell_type)?);
        }
        Ok(extent)
    }

    fn search_radius(
        &self,
        morphologies: &dyn MorphologyRepository,
        presynaptic: &CellType,
        postsynaptic: &CellType,
    ) -> ConnectivityResult<f64> {
        match self.params.cell_intersection_radius {
            Some(radius) => Ok(radius),
            None => Ok(self.extent(morphologies, presynaptic)? + self.extent(morphologies, postsynaptic)?),
        }
    }

    /// Prepared morphologies of one side, shared by every pair of a call
    fn morphology_cache<'a>(&self, morphologies: &'a dyn MorphologyRepository, hemitype: &Hemitype) -> MorphologyCache<'a> {
        MorphologyCache::new(
            morphologies,
            hemitype.compartments.clone(),
            self.params.compartment_intersection_radius,
            self.params.compartment_intersection_plane,
        )
    }

    fn connect_pair(
        &self,
        pre: &CellCollection,
        post: &CellCollection,
        ctx: &ConnectivityContext<'_>,
        caches: &mut (MorphologyCache<'_>, MorphologyCache<'_>),
        rng: &mut StdRng,
    ) -> ConnectivityResult<(ConnectivityBatch, TouchCounts)> {
        let mut batch = ConnectivityBatch::new(&self.core.name, &pre.cell_type.name, &post.cell_type.name);
        let mut counts = TouchCounts::default();
        if pre.is_empty() || post.is_empty() {
            return Ok((batch, counts));
        }

        let mut pre_morphologies = Assignments::new(ctx.morphologies, &pre.cell_type, pre.len())?;
        let mut post_morphologies = Assignments::new(ctx.morphologies, &post.cell_type, post.len())?;

        let radius = self.search_radius(ctx.morphologies, &pre.cell_type, &post.cell_type)?;
        let candidates = intersect_cells(
            &pre.positions(),
            &post.positions(),
            radius,
            self.params.cell_intersection_plane,
        );
        trace!(
            target: "cytonet-connectivity",
            "'{}': soma radius {} between {} and {}",
            self.core.name, radius, pre.cell_type.name, post.cell_type.name
        );

        let (pre_cache, post_cache) = caches;
        for (j, sources) in candidates.iter().enumerate() {
            let to = post.cells[j];
            for &i in sources {
                let from = pre.cells[i];
                counts.checked += 1;
                let from_morphology = pre_morphologies.get(i, pre_cache, rng)?;
                let to_morphology = post_morphologies.get(j, post_cache, rng)?;
                let pool = intersect_compartments(&from_morphology, from.position, &to_morphology, to.position);
                if pool.is_empty() {
                    continue;
                }
                counts.touching += 1;
                for (from_compartment, to_compartment) in self.sampler.select(rng, &pool) {
                    counts.synapses += 1;
                    batch.connections.push(Connection::with_detail(
                        from.id,
                        to.id,
                        CompartmentDetail {
                            from_compartment,
                            to_compartment,
                            from_morphology: from_morphology.name().to_string(),
                            to_morphology: to_morphology.name().to_string(),
                        },
                    ));
                }
            }
        }
        Ok((batch, counts))
    }
}

/// Lazily drawn morphology per cell of one collection
struct Assignments {
    cell_type: String,
    names: Vec<String>,
    assigned: Vec<Option<Arc<PreparedMorphology>>>,
}

impl Assignments {
    /// Fails when cells of `cell_type` cannot be given any geometry
    fn new(repository: &dyn MorphologyRepository, cell_type: &CellType, cells: usize) -> ConnectivityResult<Self> {
        let names = repository.list_morphologies(cell_type);
        if names.is_empty() {
            return Err(ConnectivityError::NoMorphologies(cell_type.name.clone()));
        }
        Ok(Self {
            cell_type: cell_type.name.clone(),
            names,
            assigned: vec![None; cells],
        })
    }

    fn get(
        &mut self,
        cell: usize,
        cache: &mut MorphologyCache<'_>,
        rng: &mut StdRng,
    ) -> ConnectivityResult<Arc<PreparedMorphology>> {
        if let Some(prepared) = &self.assigned[cell] {
            return Ok(Arc::clone(prepared));
        }
        let name = self
            .names
            .choose(rng)
            .ok_or_else(|| ConnectivityError::NoMorphologies(self.cell_type.clone()))?;
        let prepared = cache.get(name)?;
        self.assigned[cell] = Some(Arc::clone(&prepared));
        Ok(prepared)
    }
}

impl ConnectionStrategy for TouchDetector {
    fn core(&self) -> &StrategyCore {
        &self.core
    }

    fn kind(&self) -> &'static str {
        KIND
    }

    fn region_of_interest(
        &self,
        source: ChunkCoord,
        chunk_size: ChunkSize,
        ctx: &ConnectivityContext<'_>,
    ) -> ConnectivityResult<BTreeSet<ChunkCoord>> {
        let destinations = ctx.placement.populated_chunks(&self.core.postsynaptic.names());
        match self.reach(ctx.morphologies) {
            Ok(reach) => Ok(chunks_within_reach(
                source,
                chunk_size,
                reach,
                self.params.cell_intersection_plane,
                &destinations,
            )),
            // Without geometry every destination stays reachable; the
            // jobs themselves report the error
            Err(e) => {
                debug!(
                    target: "cytonet-connectivity",
                    "'{}': reach unavailable from chunk {}: {}", self.core.name, source, e
                );
                Ok(destinations)
            }
        }
    }

    fn connect(
        &self,
        presynaptic: &[CellCollection],
        postsynaptic: &[CellCollection],
        ctx: &ConnectivityContext<'_>,
        rng: &mut StdRng,
    ) -> ConnectivityResult<Vec<ConnectivityBatch>> {
        let mut caches = (
            self.morphology_cache(ctx.morphologies, &self.core.presynaptic),
            self.morphology_cache(ctx.morphologies, &self.core.postsynaptic),
        );
        let mut batches = Vec::new();
        for pre in presynaptic {
            for post in postsynaptic {
                let (batch, counts) = self.connect_pair(pre, post, ctx, &mut caches, rng)?;
                ctx.observer.emit(&ConnectivityEvent::TouchStatistics {
                    strategy: self.core.name.clone(),
                    presynaptic: pre.cell_type.name.clone(),
                    postsynaptic: post.cell_type.name.clone(),
                    checked_pairs: counts.checked,
                    touching_pairs: counts.touching,
                    synapses: counts.synapses,
                });
                batches.push(batch);
            }
        }
        Ok(batches)
    }
}
