// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always installed. With the `file-logging` feature each
//! run also gets a timestamped folder with one JSON log per crate:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       ├── cytonet-connectivity.log
//!       ├── cytonet-config.log
//!       └── cytonet.log (combined)
//! ```

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::{verbosity_level, CrateDebugFlags};
use crate::config::LoggingConfig;

/// Logging initialization result
///
/// Keep it alive for the duration of the run; dropping it flushes file logs.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder for file logs, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Initialize logging
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags
/// * `verbosity` - Configured verbosity, sets the default level
/// * `config` - Log directory and retention (used with `file-logging`)
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    verbosity: u8,
    config: &LoggingConfig,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string_with_default(verbosity_level(verbosity));
    let env_filter = EnvFilter::try_new(&filter)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", filter, e))?;

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_folder) = {
        let (file_layers, guards, run_folder) = file::file_layers(&filter, config)?;
        layers.extend(file_layers);
        (guards, Some(run_folder))
    };
    #[cfg(not(feature = "file-logging"))]
    let run_folder: Option<PathBuf> = {
        let _ = config;
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("Logging already initialized: {}", e))?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Initialize logging with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, 1, &LoggingConfig::default())
}

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use anyhow::Context;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use tracing_appender::rolling;

    type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

    pub(super) fn file_layers(
        filter: &str,
        config: &LoggingConfig,
    ) -> Result<(Vec<BoxedLayer>, Vec<tracing_appender::non_blocking::WorkerGuard>, PathBuf)> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let run_folder = config.log_dir.join(format!("run_{}", timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&config.log_dir, config.retention_days, config.retention_runs)?;

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guards = Vec::new();

        for crate_name in crate::KNOWN_CRATES {
            let appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(EnvFilter::new(format!("{}=debug", crate_name)))
                    .boxed(),
            );
        }

        let combined = rolling::daily(&run_folder, "cytonet.log");
        let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined);
        guards.push(combined_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(combined_non_blocking)
                .with_target(true)
                .json()
                .with_filter(EnvFilter::new(filter))
                .boxed(),
        );

        Ok((layers, guards, run_folder))
    }

    /// Remove run folders older than `retention_days` and keep at most
    /// `retention_runs` of the remaining ones.
    fn cleanup_old_logs(base: &Path, retention_days: u64, retention_runs: usize) -> Result<()> {
        if !base.exists() {
            return Ok(());
        }

        let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);
        let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();

        for entry in std::fs::read_dir(base)? {
            let path = entry?.path();
            let Some(stamp) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("run_"))
            else {
                continue;
            };
            if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S") {
                runs.push((path, naive.and_utc()));
            }
        }

        // Oldest first
        runs.sort_by_key(|(_, dt)| *dt);

        let expired = runs.iter().filter(|(_, dt)| *dt < cutoff).count();
        let excess = runs.len().saturating_sub(expired).saturating_sub(retention_runs);

        for (path, _) in runs.iter().take(expired + excess) {
            if let Err(e) = std::fs::remove_dir_all(path) {
                tracing::warn!(
                    target: "cytonet",
                    "Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                );
            }
        }

        Ok(())
    }
}
