// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Structural checks that must pass before any connectivity job is queued:
//! chunk size, hemitype targeting rules, cell type and `after` references,
//! and absence of dependency cycles between strategies.

use crate::{ConfigError, ConfigResult, HemitypeConfig, NetworkConfig};
use std::collections::{BTreeMap, BTreeSet};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidChunkSize { size: [f64; 3] },
    MissingTargeting { field: String },
    UnknownCellType { field: String, cell_type: String },
    UnknownStrategy { field: String, strategy: String },
    MissingStrategyKind { strategy: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidChunkSize { size } => {
                write!(f, "simulation.chunk_size {:?} must be positive and finite", size)
            }
            Self::MissingTargeting { field } => {
                write!(f, "{} needs at least one cell type when no labels are given", field)
            }
            Self::UnknownCellType { field, cell_type } => {
                write!(f, "{} references unknown cell type '{}'", field, cell_type)
            }
            Self::UnknownStrategy { field, strategy } => {
                write!(f, "{} references unknown connection strategy '{}'", field, strategy)
            }
            Self::MissingStrategyKind { strategy } => {
                write!(f, "connectivity.{}.strategy must not be empty", strategy)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found, or
/// `ConfigError::DependencyCycle` if the `after` graph is cyclic.
pub fn validate_config(config: &NetworkConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_chunk_size(config, &mut errors);
    validate_strategies(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    dependency_order(config).map(|_| ())
}

fn validate_chunk_size(config: &NetworkConfig, errors: &mut Vec<ConfigValidationError>) {
    let size = config.simulation.chunk_size;
    if size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        errors.push(ConfigValidationError::InvalidChunkSize { size });
    }
}

fn validate_strategies(config: &NetworkConfig, errors: &mut Vec<ConfigValidationError>) {
    for (name, strategy) in &config.connectivity {
        if strategy.strategy.trim().is_empty() {
            errors.push(ConfigValidationError::MissingStrategyKind {
                strategy: name.clone(),
            });
        }

        for (side, hemitype) in [
            ("presynaptic", &strategy.presynaptic),
            ("postsynaptic", &strategy.postsynaptic),
        ] {
            validate_hemitype(config, &format!("connectivity.{}.{}", name, side), hemitype, errors);
        }

        for dependency in &strategy.after {
            if !config.connectivity.contains_key(dependency) {
                errors.push(ConfigValidationError::UnknownStrategy {
                    field: format!("connectivity.{}.after", name),
                    strategy: dependency.clone(),
                });
            }
        }
    }
}

fn validate_hemitype(
    config: &NetworkConfig,
    field: &str,
    hemitype: &HemitypeConfig,
    errors: &mut Vec<ConfigValidationError>,
) {
    if !hemitype.is_targeting_valid() {
        errors.push(ConfigValidationError::MissingTargeting {
            field: field.to_string(),
        });
    }
    for cell_type in &hemitype.cell_types {
        if !config.cell_types.contains_key(cell_type) {
            errors.push(ConfigValidationError::UnknownCellType {
                field: format!("{}.cell_types", field),
                cell_type: cell_type.clone(),
            });
        }
    }
}

/// Order strategies so that every strategy comes after everything in its
/// `after` list. Ties are broken by name.
///
/// # Errors
///
/// `ConfigError::DependencyCycle` naming the strategies on a cycle, or
/// `ConfigError::ValidationError` for an unknown `after` reference.
pub fn dependency_order(config: &NetworkConfig) -> ConfigResult<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, strategy) in &config.connectivity {
        in_degree.entry(name.as_str()).or_insert(0);
        let unique: BTreeSet<&str> = strategy.after.iter().map(String::as_str).collect();
        for dependency in unique {
            if !config.connectivity.contains_key(dependency) {
                return Err(ConfigError::ValidationError(format!(
                    "connectivity.{}.after references unknown strategy '{}'",
                    name, dependency
                )));
            }
            *in_degree.entry(name.as_str()).or_insert(0) += 1;
            dependents.entry(dependency).or_default().push(name.as_str());
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != in_degree.len() {
        let cyclic = in_degree
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(n, _)| *n)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ConfigError::DependencyCycle(cyclic));
    }

    Ok(order)
}
