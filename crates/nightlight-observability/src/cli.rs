// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-nightlight-core` and `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (`all` or comma-separated)
pub const DEBUG_ENV_VAR: &str = "NIGHTLIGHT_DEBUG";

/// Set of crates with debug logging turned on
///
/// # Example
/// ```rust
/// use nightlight_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-nightlight-core".to_string()]);
/// assert!(flags.is_enabled("nightlight-core"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all`
    /// enables every known crate. Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Merge crates named in an environment-style value
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enable(crate_name);
            }
        }
    }

    /// Turn on one crate
    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build an `EnvFilter` directive string
    ///
    /// Crate names are converted to their target form (`nightlight_core`).
    /// Format: `"nightlight_core=debug,info"`, or just `base_level` if
    /// nothing is enabled.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(base_level.to_string());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `NIGHTLIGHT_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV_VAR) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV_VAR,
        DEBUG_ENV_VAR
    )
}
