// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags and verbosity mapping
//!
//! `--debug-cytonet-connectivity` raises one crate to debug level while the
//! rest follow the configured verbosity. `CYTONET_DEBUG` accepts the same
//! crate names, comma-separated.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

const FLAG_PREFIX: &str = "--debug-";

/// Crates raised to debug level
///
/// # Example
/// ```rust
/// use cytonet_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-cytonet-config".to_string()]);
/// assert!(flags.is_enabled("cytonet-config"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect `--debug-{crate}` arguments; `--debug-all` selects every known crate
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if let Some(name) = arg.strip_prefix(FLAG_PREFIX) {
                flags.enable(name);
            }
        }
        flags
    }

    fn enable(&mut self, name: &str) {
        match name.trim() {
            "" => {}
            "all" => self
                .enabled_crates
                .extend(KNOWN_CRATES.iter().map(|c| c.to_string())),
            name => {
                self.enabled_crates.insert(name.to_string());
            }
        }
    }

    fn merge_env_value(&mut self, value: &str) {
        for name in value.split(',') {
            self.enable(name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// `EnvFilter` directives: one `crate=debug` per flag, then the default level
    pub fn to_filter_string_with_default(&self, default_level: &str) -> String {
        self.enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name))
            .chain(std::iter::once(default_level.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Default log level for a configured verbosity
///
/// 0 = warnings only, 1 = info, 2 = debug, 3+ = trace.
pub fn verbosity_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Flags from the process arguments merged with `CYTONET_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var("CYTONET_DEBUG") {
        flags.merge_env_value(&value);
    }
    flags
}

pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Debug logging for every crate
  --debug-{{crate-name}}          Debug logging for one crate

Available crates:
  {}

Environment Variable:
  CYTONET_DEBUG={{crate-name}}[,{{crate-name}}] or CYTONET_DEBUG=all
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-cytonet-config".to_string(),
            "network.toml".to_string(),
        ]);
        assert!(flags.is_enabled("cytonet-config"));
        assert!(!flags.is_enabled("cytonet-connectivity"));
        assert_eq!(flags.enabled_crates.len(), 1);
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_follows_verbosity() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-cytonet-connectivity".to_string()]);
        assert_eq!(
            flags.to_filter_string_with_default(verbosity_level(1)),
            "cytonet-connectivity=debug,info"
        );
        assert_eq!(
            CrateDebugFlags::default().to_filter_string_with_default(verbosity_level(0)),
            "warn"
        );
    }

    #[test]
    fn test_env_value_merge() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value(" cytonet-config , ,cytonet");
        assert!(flags.is_enabled("cytonet-config"));
        assert!(flags.is_enabled("cytonet"));
        assert_eq!(flags.enabled_crates.len(), 2);

        let mut all = CrateDebugFlags::default();
        all.merge_env_value("all");
        assert_eq!(all.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), "warn");
        assert_eq!(verbosity_level(1), "info");
        assert_eq!(verbosity_level(2), "debug");
        assert_eq!(verbosity_level(9), "trace");
    }
}
