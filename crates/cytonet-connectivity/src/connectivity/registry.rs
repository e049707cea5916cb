// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Registry mapping strategy kinds to constructors.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use cytonet_config::{dependency_order, NetworkConfig, StrategyConfig};
use tracing::debug;

use super::strategy::ConnectionStrategy;
use super::{all_to_all, touch_detector};
use crate::models::CellTypeRegistry;
use crate::types::{ConnectivityError, ConnectivityResult};

/// Builds a strategy named `name` from its configuration
pub type StrategyBuilder =
    fn(&str, &StrategyConfig, &CellTypeRegistry) -> ConnectivityResult<Arc<dyn ConnectionStrategy>>;

#[derive(Clone, Default)]
pub struct StrategyRegistry {
    builders: BTreeMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `touch_detector` and `all_to_all`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(touch_detector::KIND, touch_detector::TouchDetector::from_config);
        registry.register(all_to_all::KIND, all_to_all::AllToAll::from_config);
        registry
    }

    pub fn register(&mut self, kind: &str, builder: StrategyBuilder) {
        self.builders.insert(kind.to_string(), builder);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }

    pub fn build(
        &self,
        name: &str,
        config: &StrategyConfig,
        cell_types: &CellTypeRegistry,
    ) -> ConnectivityResult<Arc<dyn ConnectionStrategy>> {
        let builder = self
            .builders
            .get(&config.strategy)
            .ok_or_else(|| ConnectivityError::UnknownStrategyKind(config.strategy.clone()))?;
        builder(name, config, cell_types).map_err(|e| match e {
            ConnectivityError::InvalidConfig(msg) => {
                ConnectivityError::InvalidConfig(format!("strategy '{}': {}", name, msg))
            }
            other => other,
        })
    }

    /// Every configured strategy, prerequisites before dependents
    pub fn build_all(
        &self,
        config: &NetworkConfig,
        cell_types: &CellTypeRegistry,
    ) -> ConnectivityResult<Vec<Arc<dyn ConnectionStrategy>>> {
        let order = dependency_order(config)?;
        let mut strategies = Vec::with_capacity(order.len());
        for name in order {
            let strategy_config = config
                .connectivity
                .get(&name)
                .ok_or_else(|| ConnectivityError::UnknownStrategy(name.clone()))?;
            let strategy = self.build(&name, strategy_config, cell_types)?;
            debug!(
                target: "cytonet-connectivity",
                "Built {} strategy '{}' ({:?} -> {:?})",
                strategy.kind(),
                name,
                strategy.presynaptic().names(),
                strategy.postsynaptic().names()
            );
            strategies.push(strategy);
        }
        Ok(strategies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cytonet_config::{parse_config, HemitypeConfig};

    const NETWORK: &str = r#"
[cell_types.granule]
morphologies = ["granule_a"]

[cell_types.golgi]
morphologies = ["golgi_a"]

[connectivity.granule_to_golgi]
strategy = "touch_detector"
presynaptic = { cell_types = ["granule"] }
postsynaptic = { cell_types = ["golgi"] }
after = ["golgi_to_granule"]
compartment_intersection_radius = 2.0

[connectivity.golgi_to_granule]
strategy = "all_to_all"
presynaptic = { cell_types = ["golgi"] }
postsynaptic = { cell_types = ["granule"] }
"#;

    #[test]
    fn test_build_all_in_dependency_order() {
        let config = parse_config(NETWORK).unwrap();
        let cell_types = CellTypeRegistry::from_config(&config);
        let strategies = StrategyRegistry::with_builtin().build_all(&config, &cell_types).unwrap();
        let names: Vec<_> = strategies.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["golgi_to_granule", "granule_to_golgi"]);
        assert_eq!(strategies[1].kind(), "touch_detector");
        assert_eq!(strategies[1].after(), ["golgi_to_granule".to_string()]);
        assert!(strategies[0].after().is_empty());
    }

    #[test]
    fn test_unknown_kind() {
        let registry = StrategyRegistry::with_builtin();
        let config = StrategyConfig::new(
            "fiber_tracer",
            HemitypeConfig {
                cell_types: vec!["granule".to_string()],
                ..Default::default()
            },
            HemitypeConfig {
                cell_types: vec!["granule".to_string()],
                ..Default::default()
            },
        );
        assert!(matches!(
            registry.build("x", &config, &CellTypeRegistry::new()),
            Err(ConnectivityError::UnknownStrategyKind(_))
        ));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut config = parse_config(NETWORK).unwrap();
        if let Some(strategy) = config.connectivity.get_mut("golgi_to_granule") {
            strategy
                .parameters
                .insert("radius".to_string(), toml::Value::Float(3.0));
        }
        let cell_types = CellTypeRegistry::from_config(&config);
        assert!(matches!(
            StrategyRegistry::with_builtin().build_all(&config, &cell_types),
            Err(ConnectivityError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_custom_kind() {
        let mut registry = StrategyRegistry::new();
        registry.register("dense", all_to_all::AllToAll::from_config);
        assert!(registry.contains("dense"));
        assert_eq!(registry.kinds(), vec!["dense"]);
    }
}
