// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Chunk and dependency scheduling.

For each strategy the scheduler:

1. Collects the job handles of every prerequisite strategy (`after`)
2. Resolves the region of interest of every presynaptic-populated chunk
3. Inverts those source → destination regions into destination → sources
4. Queues exactly one job per destination chunk, depending on every
   prerequisite job
*/

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cytonet_config::ConfigError;
use tracing::info;

use super::strategy::{ConnectionStrategy, ConnectivityContext};
use crate::events::ConnectivityEvent;
use crate::jobs::{JobHandle, JobPool};
use crate::spatial::{ChunkCoord, ChunkSize};
use crate::types::{ConnectivityError, ConnectivityResult};

/// Destination chunk → source chunks whose regions contain it
pub type JobPlan = BTreeMap<ChunkCoord, BTreeSet<ChunkCoord>>;

/// Inverted regions of interest of `strategy`
pub fn plan_jobs(
    strategy: &dyn ConnectionStrategy,
    chunk_size: ChunkSize,
    ctx: &ConnectivityContext<'_>,
) -> ConnectivityResult<JobPlan> {
    let sources = ctx.placement.populated_chunks(&strategy.presynaptic().names());
    let mut plan = JobPlan::new();
    for source in sources {
        for destination in strategy.region_of_interest(source, chunk_size, ctx)? {
            plan.entry(destination).or_default().insert(source);
        }
    }
    plan.retain(|_, sources| !sources.is_empty());
    Ok(plan)
}

/// Order strategies so that every strategy follows its prerequisites.
/// Ties keep the input order.
pub fn order_strategies(
    strategies: &[Arc<dyn ConnectionStrategy>],
) -> ConnectivityResult<Vec<Arc<dyn ConnectionStrategy>>> {
    let names: BTreeSet<&str> = strategies.iter().map(|s| s.name()).collect();
    for strategy in strategies {
        if let Some(missing) = strategy.after().iter().find(|a| !names.contains(a.as_str())) {
            return Err(ConnectivityError::UnknownStrategy(missing.clone()));
        }
    }

    let mut done: BTreeSet<&str> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(strategies.len());
    let mut remaining: Vec<&Arc<dyn ConnectionStrategy>> = strategies.iter().collect();
    while !remaining.is_empty() {
        let (ready, waiting): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|s| s.after().iter().all(|a| done.contains(a.as_str())));
        if ready.is_empty() {
            let cyclic: Vec<&str> = waiting.iter().map(|s| s.name()).collect();
            return Err(ConfigError::DependencyCycle(cyclic.join(", ")).into());
        }
        for strategy in ready {
            done.insert(strategy.name());
            ordered.push(Arc::clone(strategy));
        }
        remaining = waiting;
    }
    Ok(ordered)
}

/// Queues connectivity jobs and tracks the handles of each strategy
pub struct ConnectivityScheduler {
    chunk_size: ChunkSize,
    handles: BTreeMap<String, Vec<JobHandle>>,
}

impl ConnectivityScheduler {
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self {
            chunk_size,
            handles: BTreeMap::new(),
        }
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Handles queued for `strategy`
    pub fn handles(&self, strategy: &str) -> &[JobHandle] {
        self.handles.get(strategy).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_jobs(&self) -> usize {
        self.handles.values().map(Vec::len).sum()
    }

    /// Queue the jobs of one strategy. Its prerequisites must already be
    /// queued.
    pub fn queue_strategy(
        &mut self,
        strategy: &Arc<dyn ConnectionStrategy>,
        ctx: &ConnectivityContext<'_>,
        pool: &mut dyn JobPool,
    ) -> ConnectivityResult<Vec<JobHandle>> {
        let mut dependencies = Vec::new();
        for prerequisite in strategy.after() {
            let handles = self
                .handles
                .get(prerequisite)
                .ok_or_else(|| ConnectivityError::UnknownStrategy(prerequisite.clone()))?;
            dependencies.extend_from_slice(handles);
        }
        dependencies.sort_unstable();
        dependencies.dedup();

        let plan = plan_jobs(strategy.as_ref(), self.chunk_size, ctx)?;
        let mut queued = Vec::with_capacity(plan.len());
        for (target, sources) in plan {
            let sources: Vec<ChunkCoord> = sources.into_iter().collect();
            let source_count = sources.len();
            let handle = pool.queue_connectivity(
                Arc::clone(strategy),
                target,
                self.chunk_size,
                sources,
                dependencies.clone(),
            )?;
            ctx.observer.emit(&ConnectivityEvent::JobQueued {
                job: handle.0,
                strategy: strategy.name().to_string(),
                chunk: target,
                sources: source_count,
                dependencies: dependencies.len(),
            });
            queued.push(handle);
        }

        info!(
            target: "cytonet-connectivity",
            "Queued {} jobs for strategy '{}' ({} dependencies)",
            queued.len(),
            strategy.name(),
            dependencies.len()
        );
        self.handles
            .insert(strategy.name().to_string(), queued.clone());
        Ok(queued)
    }

    /// Queue every strategy, prerequisites first; returns the number of
    /// queued jobs
    pub fn queue_all(
        &mut self,
        strategies: &[Arc<dyn ConnectionStrategy>],
        ctx: &ConnectivityContext<'_>,
        pool: &mut dyn JobPool,
    ) -> ConnectivityResult<usize> {
        let mut total = 0;
        for strategy in order_strategies(strategies)? {
            total += self.queue_strategy(&strategy, ctx, pool)?.len();
        }
        Ok(total)
    }
}
