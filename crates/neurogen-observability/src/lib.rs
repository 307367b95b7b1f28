// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurogen-observability
//!
//! Logging setup shared by every neurogen binary, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with daily rotation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Log targets used across the workspace, usable with debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurogen",
    "neurogen-components",
    "neurogen-bdu",
    "neurogen-state",
    "neurogen-config",
];
