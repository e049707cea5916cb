// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, NetworkConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE_NAME: &str = "cytonet.toml";

/// Find the network configuration file
///
/// Search order:
/// 1. `CYTONET_CONFIG_PATH` environment variable
/// 2. Current working directory: `./cytonet.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("CYTONET_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by CYTONET_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet CYTONET_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Parse a network definition from TOML text, without overrides
pub fn parse_config(content: &str) -> ConfigResult<NetworkConfig> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for it.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML.
/// Structural validation is separate, see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NetworkConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config = parse_config(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `CYTONET_CHUNK_SIZE` -> `simulation.chunk_size` (`"50"` or `"50,50,20"`)
/// - `CYTONET_SEED` -> `simulation.seed`
/// - `CYTONET_VERBOSITY` -> `simulation.verbosity`
pub fn apply_environment_overrides(config: &mut NetworkConfig) {
    if let Ok(value) = env::var("CYTONET_CHUNK_SIZE") {
        set_chunk_size(config, &value);
    }
    if let Ok(value) = env::var("CYTONET_SEED") {
        set_seed(config, &value);
    }
    if let Ok(value) = env::var("CYTONET_VERBOSITY") {
        set_verbosity(config, &value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `simulation.chunk_size`, `simulation.seed`, `simulation.verbosity`.
pub fn apply_cli_overrides(config: &mut NetworkConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("simulation.chunk_size") {
        set_chunk_size(config, value);
    }
    if let Some(value) = cli_args.get("simulation.seed") {
        set_seed(config, value);
    }
    if let Some(value) = cli_args.get("simulation.verbosity") {
        set_verbosity(config, value);
    }
}

fn set_chunk_size(config: &mut NetworkConfig, value: &str) {
    match parse_chunk_size(value) {
        Some(size) => config.simulation.chunk_size = size,
        None => warn!(target: "cytonet-config", "Ignoring unparsable chunk size override '{}'", value),
    }
}

fn set_seed(config: &mut NetworkConfig, value: &str) {
    match value.trim() {
        "" | "none" => config.simulation.seed = None,
        v => match v.parse::<u64>() {
            Ok(seed) => config.simulation.seed = Some(seed),
            Err(_) => warn!(target: "cytonet-config", "Ignoring unparsable seed override '{}'", value),
        },
    }
}

fn set_verbosity(config: &mut NetworkConfig, value: &str) {
    if let Ok(verbosity) = value.trim().parse::<u8>() {
        config.simulation.verbosity = verbosity;
    }
}

/// Parse `"s"` (cubic) or `"x,y,z"`
fn parse_chunk_size(value: &str) -> Option<[f64; 3]> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match parts.as_slice() {
        [s] => Some([*s; 3]),
        [x, y, z] => Some([*x, *y, *z]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const NETWORK: &str = r#"
[simulation]
chunk_size = [50.0, 50.0, 25.0]
seed = 7

[cell_types.granule]
morphologies = ["granule_a"]
labels = ["excitatory"]

[cell_types.golgi]
morphologies = ["golgi_a", "golgi_b"]

[connectivity.granule_to_golgi]
strategy = "touch_detector"
presynaptic = { cell_types = ["granule"], compartments = ["axon"] }
postsynaptic = { cell_types = ["golgi"], compartments = ["dendrite"] }
compartment_intersection_radius = 4.0
synapses = { distribution = "normal", mean = 3.0, std_dev = 1.0 }
"#;

    #[test]
    fn test_parse_network() {
        let config = parse_config(NETWORK).unwrap();
        assert_eq!(config.simulation.chunk_size, [50.0, 50.0, 25.0]);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.verbosity, 1);
        assert_eq!(config.cell_types["golgi"].morphologies.len(), 2);

        let strategy = &config.connectivity["granule_to_golgi"];
        assert_eq!(strategy.strategy, "touch_detector");
        assert!(strategy.after.is_empty(), "after is always materialized");
        assert_eq!(strategy.presynaptic.compartments, vec!["axon".to_string()]);
        assert_eq!(
            strategy.parameters["compartment_intersection_radius"].as_float(),
            Some(4.0)
        );
        assert!(strategy.parameters.contains_key("synapses"));
        assert!(!strategy.parameters.contains_key("strategy"));
    }

    #[test]
    fn test_unknown_hemitype_field_rejected() {
        let text = r#"
[connectivity.a]
strategy = "all_to_all"
presynaptic = { cell_type = ["x"] }
postsynaptic = { cell_types = ["y"] }
"#;
        assert!(matches!(parse_config(text), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("CYTONET_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("CYTONET_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("CYTONET_CONFIG_PATH", "/nonexistent/cytonet.toml");
        let result = find_config_file();
        env::remove_var("CYTONET_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_with_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = File::create(&config_path).unwrap();
        write!(file, "{}", NETWORK).unwrap();

        env::set_var("CYTONET_CHUNK_SIZE", "20");
        env::set_var("CYTONET_SEED", "11");

        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.seed".to_string(), "99".to_string());
        cli_args.insert("simulation.verbosity".to_string(), "2".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("CYTONET_CHUNK_SIZE");
        env::remove_var("CYTONET_SEED");

        // env wins for chunk size, CLI wins for seed
        assert_eq!(config.simulation.chunk_size, [20.0, 20.0, 20.0]);
        assert_eq!(config.simulation.seed, Some(99));
        assert_eq!(config.simulation.verbosity, 2);
    }

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size("10"), Some([10.0; 3]));
        assert_eq!(parse_chunk_size("1, 2 ,3"), Some([1.0, 2.0, 3.0]));
        assert_eq!(parse_chunk_size("1,2"), None);
        assert_eq!(parse_chunk_size("abc"), None);
    }

    #[test]
    fn test_bad_override_keeps_value() {
        let mut config = NetworkConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.chunk_size".to_string(), "1,2".to_string());
        cli_args.insert("simulation.seed".to_string(), "none".to_string());
        apply_cli_overrides(&mut config, &cli_args);
        assert_eq!(config.simulation.chunk_size, [100.0; 3]);
        assert_eq!(config.simulation.seed, None);
    }
}
