// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
All-to-all connectivity: every presynaptic cell connects to every
postsynaptic cell, without compartment detail.
*/

use std::collections::BTreeSet;
use std::sync::Arc;

use cytonet_config::StrategyConfig;
use rand::rngs::StdRng;
use serde::Deserialize;

use super::strategy::{CellCollection, ConnectionStrategy, ConnectivityContext, StrategyCore};
use crate::models::{CellTypeRegistry, Connection, ConnectivityBatch};
use crate::spatial::{ChunkCoord, ChunkSize};
use crate::types::ConnectivityResult;

pub const KIND: &str = "all_to_all";

/// All-to-all takes no options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AllToAllParams {}

pub struct AllToAll {
    core: StrategyCore,
}

impl AllToAll {
    pub fn new(core: StrategyCore) -> Self {
        Self { core }
    }

    pub fn from_config(
        name: &str,
        config: &StrategyConfig,
        cell_types: &CellTypeRegistry,
    ) -> ConnectivityResult<Arc<dyn ConnectionStrategy>> {
        let _: AllToAllParams = toml::Value::Table(config.parameters.clone()).try_into()?;
        Ok(Arc::new(Self::new(StrategyCore::from_config(name, config, cell_types)?)))
    }
}

impl ConnectionStrategy for AllToAll {
    fn core(&self) -> &StrategyCore {
        &self.core
    }

    fn kind(&self) -> &'static str {
        KIND
    }

    /// Every chunk holding postsynaptic cells
    fn region_of_interest(
        &self,
        _source: ChunkCoord,
        _chunk_size: ChunkSize,
        ctx: &ConnectivityContext<'_>,
    ) -> ConnectivityResult<BTreeSet<ChunkCoord>> {
        Ok(ctx.placement.populated_chunks(&self.core.postsynaptic.names()))
    }

    fn connect(
        &self,
        presynaptic: &[CellCollection],
        postsynaptic: &[CellCollection],
        _ctx: &ConnectivityContext<'_>,
        _rng: &mut StdRng,
    ) -> ConnectivityResult<Vec<ConnectivityBatch>> {
        let mut batches = Vec::with_capacity(presynaptic.len() * postsynaptic.len());
        for pre in presynaptic {
            for post in postsynaptic {
                let mut batch = ConnectivityBatch::new(&self.core.name, &pre.cell_type.name, &post.cell_type.name);
                batch.connections.reserve(pre.len() * post.len());
                for from in &pre.cells {
                    for to in &post.cells {
                        batch.connections.push(Connection::new(from.id, to.id));
                    }
                }
                batches.push(batch);
            }
        }
        Ok(batches)
    }
}
