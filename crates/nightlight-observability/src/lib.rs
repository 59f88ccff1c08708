// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! # nightlight-observability
//!
//! Logging setup shared by the nightlight binaries.
//!
//! Library crates only use the `tracing` facade; this crate installs the
//! subscriber, with per-crate debug flags so one noisy layer (say, the
//! engine's dispatch trace) can be turned up without the rest.
//!
//! ## Features
//! - `file-logging`: JSON log file in a timestamped run folder (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known nightlight crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "nightlight-config",
    "nightlight-hal",
    "nightlight-core",
    "nightlight-behaviors",
    "nightlight-sim",
];
