// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity jobs and the pools that run them.

A job connects the cells of one strategy into one destination chunk. Its
presynaptic scope is the job's source chunks (the chunks whose region of
interest contains the destination); its postsynaptic scope is the
destination chunk alone, so jobs of one strategy never produce the same
edge twice.

[`LocalJobPool`] runs jobs in waves: every pending job whose dependencies
have all completed runs in the next wave, in parallel with the `parallel`
feature. A job with a failed or skipped dependency is skipped, never run.
*/

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::connectivity::{CellCollection, ConnectionStrategy, ConnectivityContext};
use crate::events::ConnectivityEvent;
use crate::models::ConnectivitySink;
use crate::rng::job_rng;
use crate::spatial::{ChunkCoord, ChunkSize};
use crate::types::ConnectivityResult;

/// Opaque reference to a queued job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobHandle(pub u64);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of connectivity work
#[derive(Clone)]
pub struct ConnectivityJob {
    pub handle: JobHandle,
    pub strategy: Arc<dyn ConnectionStrategy>,
    pub target: ChunkCoord,
    pub chunk_size: ChunkSize,
    /// Presynaptic chunk scope, sorted and without duplicates
    pub sources: Vec<ChunkCoord>,
    pub dependencies: Vec<JobHandle>,
}

impl fmt::Debug for ConnectivityJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityJob")
            .field("handle", &self.handle)
            .field("strategy", &self.strategy.name())
            .field("target", &self.target)
            .field("sources", &self.sources)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Accepts jobs; a job must not start before all of its dependencies
/// completed
pub trait JobPool {
    fn queue_connectivity(
        &mut self,
        strategy: Arc<dyn ConnectionStrategy>,
        target: ChunkCoord,
        chunk_size: ChunkSize,
        sources: Vec<ChunkCoord>,
        dependencies: Vec<JobHandle>,
    ) -> ConnectivityResult<JobHandle>;
}

/// Run one job and commit its connections; returns the number of edges
pub fn run_job(
    job: &ConnectivityJob,
    ctx: &ConnectivityContext<'_>,
    sink: &dyn ConnectivitySink,
) -> ConnectivityResult<usize> {
    let strategy = &job.strategy;
    let presynaptic: Vec<CellCollection> = strategy
        .presynaptic()
        .cell_types
        .iter()
        .map(|ct| CellCollection::gather(ctx.placement, ct, &job.sources))
        .collect();
    let postsynaptic: Vec<CellCollection> = strategy
        .postsynaptic()
        .cell_types
        .iter()
        .map(|ct| CellCollection::gather(ctx.placement, ct, &[job.target]))
        .collect();

    let mut rng = job_rng(ctx.seed, strategy.name(), job.target);
    let batches = strategy.connect(&presynaptic, &postsynaptic, ctx, &mut rng)?;
    let edges = batches.iter().map(|b| b.len()).sum();
    let tagged = batches
        .into_iter()
        .map(|batch| (strategy.tag(&batch.presynaptic, &batch.postsynaptic), batch))
        .collect();
    sink.append_all(tagged)?;
    Ok(edges)
}

/// State of a job in a [`LocalJobPool`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed { edges: usize },
    Failed(String),
    Skipped,
}

/// Outcome of [`LocalJobPool::execute`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub waves: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub connections: usize,
    pub failures: Vec<(JobHandle, String)>,
    /// Handles in the order their jobs started
    pub execution_order: Vec<JobHandle>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// In-process job pool
#[derive(Debug, Default)]
pub struct LocalJobPool {
    jobs: Vec<ConnectivityJob>,
    statuses: Vec<JobStatus>,
}

impl LocalJobPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[ConnectivityJob] {
        &self.jobs
    }

    pub fn status(&self, handle: JobHandle) -> Option<&JobStatus> {
        self.statuses.get(handle.0 as usize)
    }

    fn dependency_state(&self, job: &ConnectivityJob) -> DependencyState {
        let mut state = DependencyState::Satisfied;
        for dependency in &job.dependencies {
            match self.statuses.get(dependency.0 as usize) {
                Some(JobStatus::Completed { .. }) => {}
                Some(JobStatus::Pending) => state = DependencyState::Waiting,
                Some(JobStatus::Failed(_)) | Some(JobStatus::Skipped) | None => return DependencyState::Broken,
            }
        }
        state
    }

    /// Run every pending job, honoring dependencies
    pub fn execute(&mut self, ctx: &ConnectivityContext<'_>, sink: &dyn ConnectivitySink) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        loop {
            let mut ready = Vec::new();
            let mut progressed = false;
            for i in 0..self.jobs.len() {
                if self.statuses[i] != JobStatus::Pending {
                    continue;
                }
                match self.dependency_state(&self.jobs[i]) {
                    DependencyState::Satisfied => ready.push(i),
                    DependencyState::Waiting => {}
                    DependencyState::Broken => {
                        let job = &self.jobs[i];
                        self.statuses[i] = JobStatus::Skipped;
                        report.skipped += 1;
                        progressed = true;
                        ctx.observer.emit(&ConnectivityEvent::JobSkipped {
                            job: job.handle.0,
                            strategy: job.strategy.name().to_string(),
                        });
                    }
                }
            }
            if ready.is_empty() {
                if progressed {
                    continue;
                }
                break;
            }

            report.waves += 1;
            debug!(
                target: "cytonet-connectivity",
                "Wave {}: running {} jobs", report.waves, ready.len()
            );
            for &i in &ready {
                let job = &self.jobs[i];
                report.execution_order.push(job.handle);
                ctx.observer.emit(&ConnectivityEvent::JobStarted {
                    job: job.handle.0,
                    strategy: job.strategy.name().to_string(),
                    chunk: job.target,
                });
            }

            let results = run_wave(&self.jobs, &ready, ctx, sink);

            for (i, result) in results {
                let job = &self.jobs[i];
                match result {
                    Ok(edges) => {
                        self.statuses[i] = JobStatus::Completed { edges };
                        report.completed += 1;
                        report.connections += edges;
                        ctx.observer.emit(&ConnectivityEvent::JobCompleted {
                            job: job.handle.0,
                            strategy: job.strategy.name().to_string(),
                            edges,
                        });
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        self.statuses[i] = JobStatus::Failed(reason.clone());
                        report.failed += 1;
                        report.failures.push((job.handle, reason.clone()));
                        ctx.observer.emit(&ConnectivityEvent::JobFailed {
                            job: job.handle.0,
                            strategy: job.strategy.name().to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        // Whatever is still pending waits on a job that will never finish
        for i in 0..self.jobs.len() {
            if self.statuses[i] == JobStatus::Pending {
                self.statuses[i] = JobStatus::Skipped;
                report.skipped += 1;
            }
        }

        info!(
            target: "cytonet-connectivity",
            "Executed {} jobs in {} waves: {} completed, {} failed, {} skipped, {} connections",
            self.jobs.len(),
            report.waves,
            report.completed,
            report.failed,
            report.skipped,
            report.connections
        );
        report
    }
}

enum DependencyState {
    Satisfied,
    Waiting,
    Broken,
}

#[cfg(feature = "parallel")]
fn run_wave(
    jobs: &[ConnectivityJob],
    ready: &[usize],
    ctx: &ConnectivityContext<'_>,
    sink: &dyn ConnectivitySink,
) -> Vec<(usize, ConnectivityResult<usize>)> {
    ready
        .par_iter()
        .map(|&i| (i, run_job(&jobs[i], ctx, sink)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_wave(
    jobs: &[ConnectivityJob],
    ready: &[usize],
    ctx: &ConnectivityContext<'_>,
    sink: &dyn ConnectivitySink,
) -> Vec<(usize, ConnectivityResult<usize>)> {
    ready
        .iter()
        .map(|&i| (i, run_job(&jobs[i], ctx, sink)))
        .collect()
}

impl JobPool for LocalJobPool {
    fn queue_connectivity(
        &mut self,
        strategy: Arc<dyn ConnectionStrategy>,
        target: ChunkCoord,
        chunk_size: ChunkSize,
        mut sources: Vec<ChunkCoord>,
        dependencies: Vec<JobHandle>,
    ) -> ConnectivityResult<JobHandle> {
        sources.sort_unstable();
        sources.dedup();
        let handle = JobHandle(self.jobs.len() as u64);
        self.jobs.push(ConnectivityJob {
            handle,
            strategy,
            target,
            chunk_size,
            sources,
            dependencies,
        });
        self.statuses.push(JobStatus::Pending);
        Ok(handle)
    }
}
