// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # cytonet-observability
//!
//! Logging setup shared by the cytonet crates.
//!
//! Provides console logging filtered by per-crate debug flags and, with the
//! `file-logging` feature, per-crate JSON log files with retention.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known cytonet crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "cytonet",
    "cytonet-config",
    "cytonet-connectivity",
];
