// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connections, connectivity sets and the sink that collects them.

A connectivity set stores edges column-wise. When edges carry compartment
detail, two side tables run parallel to the edge list: the compartment
index pair, and a pair of indices into a morphology name map so each name
is stored once.
*/

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{CellId, ConnectivityError, ConnectivityResult};

/// Which compartments of which morphologies form a synapse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompartmentDetail {
    pub from_compartment: usize,
    pub to_compartment: usize,
    pub from_morphology: String,
    pub to_morphology: String,
}

/// One directed edge; a detailed edge is one synapse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from_id: CellId,
    pub to_id: CellId,
    pub detail: Option<CompartmentDetail>,
}

impl Connection {
    pub fn new(from_id: CellId, to_id: CellId) -> Self {
        Self {
            from_id,
            to_id,
            detail: None,
        }
    }

    pub fn with_detail(from_id: CellId, to_id: CellId, detail: CompartmentDetail) -> Self {
        Self {
            from_id,
            to_id,
            detail: Some(detail),
        }
    }
}

/// Edges produced for one cell-type pair by one job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectivityBatch {
    pub strategy: String,
    pub presynaptic: String,
    pub postsynaptic: String,
    pub connections: Vec<Connection>,
}

impl ConnectivityBatch {
    pub fn new(strategy: &str, presynaptic: &str, postsynaptic: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            presynaptic: presynaptic.to_string(),
            postsynaptic: postsynaptic.to_string(),
            connections: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn detailed(&self) -> ConnectivityResult<Option<bool>> {
        let Some(first) = self.connections.first() else {
            return Ok(None);
        };
        let detailed = first.detail.is_some();
        if self
            .connections
            .iter()
            .any(|c| c.detail.is_some() != detailed)
        {
            return Err(ConnectivityError::IncompleteConnection(format!(
                "batch from '{}' mixes detailed and plain connections",
                self.strategy
            )));
        }
        Ok(Some(detailed))
    }
}

/// Who contributed to a connectivity set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityMetadata {
    pub strategies: BTreeSet<String>,
    pub presynaptic_types: BTreeSet<String>,
    pub postsynaptic_types: BTreeSet<String>,
}

/// Durable collection of edges under one tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectivitySet {
    pub tag: String,
    pub connections: Vec<[CellId; 2]>,
    pub compartments: Vec<[usize; 2]>,
    pub morphologies: Vec<[usize; 2]>,
    pub morphology_names: Vec<String>,
    pub metadata: ConnectivityMetadata,
}

impl ConnectivitySet {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn has_compartment_data(&self) -> bool {
        !self.compartments.is_empty()
    }

    fn check_compatible(&self, batch: &ConnectivityBatch) -> ConnectivityResult<()> {
        match batch.detailed()? {
            Some(detailed) if !self.is_empty() && detailed != self.has_compartment_data() => {
                Err(ConnectivityError::IncompleteConnection(format!(
                    "set '{}' cannot mix detailed and plain connections",
                    self.tag
                )))
            }
            _ => Ok(()),
        }
    }

    fn morphology_index(&mut self, name: &str) -> usize {
        match self.morphology_names.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                self.morphology_names.push(name.to_string());
                self.morphology_names.len() - 1
            }
        }
    }

    /// Append a batch whose detail kind was already checked
    fn extend(&mut self, batch: ConnectivityBatch) {
        self.metadata.strategies.insert(batch.strategy);
        self.metadata.presynaptic_types.insert(batch.presynaptic);
        self.metadata.postsynaptic_types.insert(batch.postsynaptic);
        for connection in batch.connections {
            self.connections.push([connection.from_id, connection.to_id]);
            if let Some(detail) = connection.detail {
                let from = self.morphology_index(&detail.from_morphology);
                let to = self.morphology_index(&detail.to_morphology);
                self.compartments
                    .push([detail.from_compartment, detail.to_compartment]);
                self.morphologies.push([from, to]);
            }
        }
    }

    /// Append edges, rejecting batches that would break the side tables
    pub fn append(&mut self, batch: ConnectivityBatch) -> ConnectivityResult<()> {
        self.check_compatible(&batch)?;
        self.extend(batch);
        Ok(())
    }

    /// Rebuild every edge with its compartment detail, if any
    pub fn intersections(&self) -> Vec<Connection> {
        self.connections
            .iter()
            .enumerate()
            .map(|(i, &[from_id, to_id])| {
                let detail = match (self.compartments.get(i), self.morphologies.get(i)) {
                    (Some(&[fc, tc]), Some(&[fm, tm])) => Some(CompartmentDetail {
                        from_compartment: fc,
                        to_compartment: tc,
                        from_morphology: self.morphology_names.get(fm).cloned().unwrap_or_default(),
                        to_morphology: self.morphology_names.get(tm).cloned().unwrap_or_default(),
                    }),
                    _ => None,
                };
                Connection {
                    from_id,
                    to_id,
                    detail,
                }
            })
            .collect()
    }

    pub fn to_json(&self) -> ConnectivityResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Destination for produced connectivity
///
/// Implementations must accept concurrent appends from independent jobs.
/// A job commits all of its batches with one [`append_all`] call, which
/// must store every batch or none of them.
///
/// [`append_all`]: ConnectivitySink::append_all
pub trait ConnectivitySink: Send + Sync {
    /// Append every `(tag, batch)` of a job, or none of them
    fn append_all(&self, batches: Vec<(String, ConnectivityBatch)>) -> ConnectivityResult<()>;

    fn append(&self, tag: &str, batch: ConnectivityBatch) -> ConnectivityResult<()> {
        self.append_all(vec![(tag.to_string(), batch)])
    }
}

/// Thread-safe sink holding connectivity sets in memory
#[derive(Debug, Default)]
pub struct MemoryConnectivitySink {
    sets: Mutex<BTreeMap<String, ConnectivitySet>>,
}

impl MemoryConnectivitySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Option<ConnectivitySet> {
        self.sets.lock().get(tag).cloned()
    }

    pub fn tags(&self) -> Vec<String> {
        self.sets.lock().keys().cloned().collect()
    }

    pub fn total_connections(&self) -> usize {
        self.sets.lock().values().map(ConnectivitySet::len).sum()
    }

    pub fn into_sets(self) -> BTreeMap<String, ConnectivitySet> {
        self.sets.into_inner()
    }
}

impl ConnectivitySink for MemoryConnectivitySink {
    fn append_all(&self, batches: Vec<(String, ConnectivityBatch)>) -> ConnectivityResult<()> {
        let mut sets = self.sets.lock();

        // Every batch is checked before any set changes
        let mut kinds: BTreeMap<&str, Option<bool>> = BTreeMap::new();
        for (tag, batch) in &batches {
            let known = kinds.entry(tag.as_str()).or_insert_with(|| {
                sets.get(tag)
                    .filter(|set| !set.is_empty())
                    .map(ConnectivitySet::has_compartment_data)
            });
            if let Some(detailed) = batch.detailed()? {
                match *known {
                    Some(existing) if existing != detailed => {
                        return Err(ConnectivityError::IncompleteConnection(format!(
                            "set '{}' cannot mix detailed and plain connections",
                            tag
                        )));
                    }
                    _ => *known = Some(detailed),
                }
            }
        }

        for (tag, batch) in batches {
            sets.entry(tag)
                .or_insert_with_key(|tag| ConnectivitySet::new(tag))
                .extend(batch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detailed(from: CellId, to: CellId, fc: usize, tc: usize) -> Connection {
        Connection::with_detail(
            from,
            to,
            CompartmentDetail {
                from_compartment: fc,
                to_compartment: tc,
                from_morphology: "granule_a".to_string(),
                to_morphology: "golgi_a".to_string(),
            },
        )
    }

    #[test]
    fn test_side_tables_round_trip() {
        let mut batch = ConnectivityBatch::new("touch", "granule", "golgi");
        batch.connections = vec![detailed(0, 5, 1, 0), detailed(0, 5, 2, 3)];

        let mut set = ConnectivitySet::new("granule_to_golgi");
        set.append(batch.clone()).unwrap();
        assert_eq!(set.morphology_names, vec!["granule_a", "golgi_a"]);
        assert_eq!(set.morphologies, vec![[0, 1], [0, 1]]);
        assert_eq!(set.intersections(), batch.connections);
        assert!(set.metadata.strategies.contains("touch"));
    }

    #[test]
    fn test_mixed_detail_is_rejected() {
        let mut batch = ConnectivityBatch::new("touch", "granule", "golgi");
        batch.connections = vec![detailed(0, 5, 1, 0), Connection::new(1, 5)];
        let mut set = ConnectivitySet::new("t");
        assert!(matches!(
            set.append(batch),
            Err(ConnectivityError::IncompleteConnection(_))
        ));
        assert!(set.is_empty());
    }

    #[test]
    fn test_sink_append_all_is_atomic() {
        let sink = MemoryConnectivitySink::new();
        let mut good = ConnectivityBatch::new("touch", "granule", "golgi");
        good.connections = vec![detailed(0, 5, 1, 0)];
        let mut bad = ConnectivityBatch::new("touch", "granule", "golgi");
        bad.connections = vec![Connection::new(1, 5)];

        assert!(sink
            .append_all(vec![("t".to_string(), good.clone()), ("u".to_string(), bad.clone()), ("u".to_string(), good.clone())])
            .is_err());
        assert!(sink.get("t").is_none());
        assert!(sink.get("u").is_none());

        sink.append_all(vec![("t".to_string(), good)]).unwrap();
        assert_eq!(sink.total_connections(), 1);
    }

    #[test]
    fn test_json_export() {
        let mut set = ConnectivitySet::new("a_to_b");
        let mut batch = ConnectivityBatch::new("all", "a", "b");
        batch.connections = vec![Connection::new(1, 2)];
        set.append(batch).unwrap();
        let json: serde_json::Value = serde_json::from_str(&set.to_json().unwrap()).unwrap();
        assert_eq!(json["tag"], "a_to_b");
        assert_eq!(json["connections"][0][1], 2);
    }
}
