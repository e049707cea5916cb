// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity pipeline: from a network definition to stored connections.

Stages:

1. **Validation**: the network definition is checked as a whole
2. **Construction**: strategies are built through the registry
3. **Scheduling**: jobs are queued, prerequisites first
4. **Execution**: the local job pool runs every job and fills the sink

Configuration problems abort before any job is queued. Job failures do
not abort the run; they are listed in the report.
*/

use std::sync::Arc;
use std::time::Instant;

use cytonet_config::{validate_config, NetworkConfig};
use parking_lot::RwLock;
use tracing::{error, info};

use crate::connectivity::{ConnectionStrategy, ConnectivityContext, ConnectivityScheduler, StrategyRegistry};
use crate::events::{ConnectivityObserver, TracingObserver};
use crate::jobs::{ExecutionReport, LocalJobPool};
use crate::models::{CellTypeRegistry, ConnectivitySink, MorphologyRepository, PlacementIndex};
use crate::types::ConnectivityResult;

/// Pipeline stage tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Not started
    Initialization,
    /// Checking the network definition
    Validation,
    /// Building strategies from configuration
    Construction,
    /// Queueing jobs
    Scheduling,
    /// Running jobs
    Execution,
    /// Every job completed
    Completed,
    /// Configuration was rejected or some job did not complete
    Failed,
}

/// Pipeline progress information
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    pub strategies_built: usize,
    pub jobs_queued: usize,
    pub connections_created: usize,
    pub duration_ms: u64,
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self {
            stage: PipelineStage::Initialization,
            strategies_built: 0,
            jobs_queued: 0,
            connections_created: 0,
            duration_ms: 0,
        }
    }
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct ConnectivityReport {
    /// Strategy names in the order they were scheduled
    pub strategies: Vec<String>,
    pub jobs_queued: usize,
    pub execution: ExecutionReport,
    pub duration_ms: u64,
}

impl ConnectivityReport {
    pub fn connections(&self) -> usize {
        self.execution.connections
    }

    pub fn is_success(&self) -> bool {
        self.execution.is_success()
    }
}

/// Connectivity pipeline orchestrator
pub struct ConnectivityPipeline {
    config: NetworkConfig,
    registry: StrategyRegistry,
    progress: Arc<RwLock<PipelineProgress>>,
    start_time: Instant,
}

impl ConnectivityPipeline {
    /// Pipeline with the builtin strategy kinds
    pub fn new(config: NetworkConfig) -> Self {
        Self::with_registry(config, StrategyRegistry::with_builtin())
    }

    pub fn with_registry(config: NetworkConfig, registry: StrategyRegistry) -> Self {
        Self {
            config,
            registry,
            progress: Arc::new(RwLock::new(PipelineProgress::default())),
            start_time: Instant::now(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn get_progress(&self) -> PipelineProgress {
        self.progress.read().clone()
    }

    /// Validate and build every strategy, prerequisites first
    pub fn build_strategies(&self) -> ConnectivityResult<Vec<Arc<dyn ConnectionStrategy>>> {
        self.update_stage(PipelineStage::Validation);
        validate_config(&self.config)?;

        self.update_stage(PipelineStage::Construction);
        let cell_types = CellTypeRegistry::from_config(&self.config);
        let strategies = self.registry.build_all(&self.config, &cell_types)?;
        self.update_progress(|p| p.strategies_built = strategies.len());
        Ok(strategies)
    }

    /// Run with events logged at the configured verbosity
    pub fn run(
        &mut self,
        placement: &dyn PlacementIndex,
        morphologies: &dyn MorphologyRepository,
        sink: &dyn ConnectivitySink,
    ) -> ConnectivityResult<ConnectivityReport> {
        let observer = TracingObserver::new(self.config.simulation.verbosity);
        self.run_with_observer(placement, morphologies, sink, &observer)
    }

    pub fn run_with_observer(
        &mut self,
        placement: &dyn PlacementIndex,
        morphologies: &dyn MorphologyRepository,
        sink: &dyn ConnectivitySink,
        observer: &dyn ConnectivityObserver,
    ) -> ConnectivityResult<ConnectivityReport> {
        self.start_time = Instant::now();
        *self.progress.write() = PipelineProgress::default();

        let strategies = match self.build_strategies() {
            Ok(strategies) => strategies,
            Err(e) => {
                error!(target: "cytonet-connectivity", "Connectivity configuration rejected: {}", e);
                self.update_stage(PipelineStage::Failed);
                return Err(e);
            }
        };

        let ctx = ConnectivityContext {
            placement,
            morphologies,
            observer,
            seed: self.config.simulation.seed,
        };

        self.update_stage(PipelineStage::Scheduling);
        let mut pool = LocalJobPool::new();
        let mut scheduler = ConnectivityScheduler::new(self.config.simulation.chunk_size);
        let jobs_queued = match scheduler.queue_all(&strategies, &ctx, &mut pool) {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(target: "cytonet-connectivity", "Scheduling failed: {}", e);
                self.update_stage(PipelineStage::Failed);
                return Err(e);
            }
        };
        self.update_progress(|p| p.jobs_queued = jobs_queued);

        self.update_stage(PipelineStage::Execution);
        let execution = pool.execute(&ctx, sink);
        self.update_progress(|p| p.connections_created = execution.connections);

        let stage = if execution.is_success() {
            PipelineStage::Completed
        } else {
            PipelineStage::Failed
        };
        self.update_stage(stage);

        let report = ConnectivityReport {
            strategies: strategies.iter().map(|s| s.name().to_string()).collect(),
            jobs_queued,
            execution,
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        };
        info!(
            target: "cytonet-connectivity",
            "Connectivity finished in {}ms: {} strategies, {} jobs, {} connections",
            report.duration_ms,
            report.strategies.len(),
            report.jobs_queued,
            report.connections()
        );
        Ok(report)
    }

    fn update_stage(&self, stage: PipelineStage) {
        let mut p = self.progress.write();
        p.stage = stage;
        p.duration_ms = self.start_time.elapsed().as_millis() as u64;
    }

    fn update_progress<F>(&self, f: F)
    where
        F: FnOnce(&mut PipelineProgress),
    {
        let mut p = self.progress.write();
        f(&mut p);
        p.duration_ms = self.start_time.elapsed().as_millis() as u64;
    }
}
