// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Structured progress events for the connectivity phase.

Components report through a [`ConnectivityObserver`] instead of logging
directly, so hosts can route events to their own sinks. [`TracingObserver`]
forwards them to `tracing`, gated by the configured verbosity.
*/

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, info, warn, Level};

use crate::spatial::ChunkCoord;

/// Something worth reporting during scheduling or execution
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityEvent {
    JobQueued {
        job: u64,
        strategy: String,
        chunk: ChunkCoord,
        sources: usize,
        dependencies: usize,
    },
    JobStarted {
        job: u64,
        strategy: String,
        chunk: ChunkCoord,
    },
    JobCompleted {
        job: u64,
        strategy: String,
        edges: usize,
    },
    JobFailed {
        job: u64,
        strategy: String,
        reason: String,
    },
    JobSkipped {
        job: u64,
        strategy: String,
    },
    /// Candidate and touch counts for one cell-type pair within one job
    TouchStatistics {
        strategy: String,
        presynaptic: String,
        postsynaptic: String,
        checked_pairs: usize,
        touching_pairs: usize,
        synapses: usize,
    },
}

pub trait ConnectivityObserver: Send + Sync {
    fn emit(&self, event: &ConnectivityEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ConnectivityObserver for NullObserver {
    fn emit(&self, _event: &ConnectivityEvent) {}
}

impl fmt::Display for ConnectivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityEvent::JobQueued {
                job,
                strategy,
                chunk,
                sources,
                dependencies,
            } => write!(
                f,
                "Queued job {} for '{}' at chunk {} ({} source chunks, {} dependencies)",
                job, strategy, chunk, sources, dependencies
            ),
            ConnectivityEvent::JobStarted { job, strategy, chunk } => {
                write!(f, "Job {} started: '{}' at chunk {}", job, strategy, chunk)
            }
            ConnectivityEvent::JobCompleted { job, strategy, edges } => {
                write!(f, "Job {} completed: '{}' produced {} connections", job, strategy, edges)
            }
            ConnectivityEvent::JobFailed { job, strategy, reason } => {
                write!(f, "Job {} failed: '{}': {}", job, strategy, reason)
            }
            ConnectivityEvent::JobSkipped { job, strategy } => {
                write!(f, "Job {} skipped: '{}' has a failed dependency", job, strategy)
            }
            ConnectivityEvent::TouchStatistics {
                strategy,
                presynaptic,
                postsynaptic,
                checked_pairs,
                touching_pairs,
                synapses,
            } => write!(
                f,
                "'{}': checked {} candidate pairs from {} to {}, {} touching, {} synapses",
                strategy, checked_pairs, presynaptic, postsynaptic, touching_pairs, synapses
            ),
        }
    }
}

/// Logs events through `tracing`
///
/// Verbosity 0 stays silent. 1 logs the job lifecycle at `info` (failures
/// and skips at `warn`), which the default `info` filter of verbosity 1
/// shows. 2 and above adds per-pair touch statistics at `debug`.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    verbosity: u8,
}

impl TracingObserver {
    pub fn new(verbosity: u8) -> Self {
        Self { verbosity }
    }

    /// Level `event` is logged at, `None` when the verbosity hides it
    pub fn level(&self, event: &ConnectivityEvent) -> Option<Level> {
        match event {
            _ if self.verbosity == 0 => None,
            ConnectivityEvent::JobFailed { .. } | ConnectivityEvent::JobSkipped { .. } => Some(Level::WARN),
            ConnectivityEvent::TouchStatistics { .. } if self.verbosity < 2 => None,
            ConnectivityEvent::TouchStatistics { .. } => Some(Level::DEBUG),
            _ => Some(Level::INFO),
        }
    }
}

impl ConnectivityObserver for TracingObserver {
    fn emit(&self, event: &ConnectivityEvent) {
        let Some(level) = self.level(event) else {
            return;
        };
        if level == Level::WARN {
            warn!(target: "cytonet-connectivity", "{}", event);
        } else if level == Level::INFO {
            info!(target: "cytonet-connectivity", "{}", event);
        } else {
            debug!(target: "cytonet-connectivity", "{}", event);
        }
    }
}

/// Keeps every event, for inspection in tests and tools
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ConnectivityEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConnectivityEvent> {
        self.events.lock().clone()
    }
}

impl ConnectivityObserver for RecordingObserver {
    fn emit(&self, event: &ConnectivityEvent) {
        self.events.lock().push(event.clone());
    }
}
