// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Cell types and their lookup registry.

A cell type owns no cells; positions come from the placement index and
geometry from the morphology repository.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use cytonet_config::{CellTypeConfig, NetworkConfig};
use serde::{Deserialize, Serialize};

use crate::types::{ConnectivityError, ConnectivityResult};

/// A population of cells sharing placement and morphology rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellType {
    pub name: String,
    pub relay: bool,
    pub labels: Vec<String>,
    /// Morphology names that can represent a cell of this type
    pub morphologies: Vec<String>,
}

impl CellType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            relay: false,
            labels: Vec::new(),
            morphologies: Vec::new(),
        }
    }

    pub fn from_config(name: &str, config: &CellTypeConfig) -> Self {
        Self {
            name: name.to_string(),
            relay: config.relay,
            labels: config.labels.clone(),
            morphologies: config.morphologies.clone(),
        }
    }

    pub fn with_morphologies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.morphologies = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Name-ordered collection of cell types
#[derive(Debug, Clone, Default)]
pub struct CellTypeRegistry {
    cell_types: BTreeMap<String, Arc<CellType>>,
}

impl CellTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        let mut registry = Self::new();
        for (name, cell_type) in &config.cell_types {
            registry.insert(CellType::from_config(name, cell_type));
        }
        registry
    }

    pub fn insert(&mut self, cell_type: CellType) -> Arc<CellType> {
        let cell_type = Arc::new(cell_type);
        self.cell_types
            .insert(cell_type.name.clone(), Arc::clone(&cell_type));
        cell_type
    }

    pub fn get(&self, name: &str) -> ConnectivityResult<Arc<CellType>> {
        self.cell_types
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectivityError::UnknownCellType(name.to_string()))
    }

    /// Cell types carrying any of `labels`
    pub fn with_any_label(&self, labels: &[String]) -> Vec<Arc<CellType>> {
        self.cell_types
            .values()
            .filter(|ct| labels.iter().any(|l| ct.has_label(l)))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cell_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CellType>> {
        self.cell_types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        let mut registry = CellTypeRegistry::new();
        registry.insert(CellType::new("granule").with_labels(["excitatory"]));
        registry.insert(CellType::new("golgi").with_labels(["inhibitory"]));
        registry.insert(CellType::new("mossy").with_labels(["excitatory", "relay"]));

        let names: Vec<_> = registry
            .with_any_label(&["excitatory".to_string()])
            .iter()
            .map(|ct| ct.name.clone())
            .collect();
        assert_eq!(names, vec!["granule".to_string(), "mossy".to_string()]);
        assert!(matches!(
            registry.get("purkinje"),
            Err(ConnectivityError::UnknownCellType(_))
        ));
    }
}
