// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NightlightConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "nightlight.toml";

/// Find the nightlight configuration file
///
/// Search order:
/// 1. `NIGHTLIGHT_CONFIG_PATH` environment variable
/// 2. Current working directory: `./nightlight.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NIGHTLIGHT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by NIGHTLIGHT_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NIGHTLIGHT_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Validation is a separate step, see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NightlightConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NightlightConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Parse an address in decimal or `0x`-prefixed hex
fn parse_address(value: &str) -> Option<u64> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NIGHTLIGHT_BROADCAST_ADDRESS` -> `radio.broadcast_address`
/// - `NIGHTLIGHT_PAYLOAD_SIZE` -> `radio.payload_size`
/// - `NIGHTLIGHT_NODE_NAME` -> `node.name`
/// - `NIGHTLIGHT_PERSONAL_OFFSET` -> `node.personal_offset`
/// - `NIGHTLIGHT_LEGACY_COMMAND_END` -> `node.legacy_command_end`
/// - `NIGHTLIGHT_HELLO_INTERVAL_MS` -> `timing.hello_interval_ms`
/// - `NIGHTLIGHT_CONTROL_LEASE_MS` -> `timing.control_lease_ms`
/// - `NIGHTLIGHT_LED_PIN` -> `outputs.led_pin`
/// - `NIGHTLIGHT_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut NightlightConfig) {
    // Radio settings
    if let Ok(value) = env::var("NIGHTLIGHT_BROADCAST_ADDRESS") {
        if let Some(address) = parse_address(&value) {
            config.radio.broadcast_address = address;
        }
    }
    if let Ok(value) = env::var("NIGHTLIGHT_PAYLOAD_SIZE") {
        if let Ok(size) = value.parse::<u8>() {
            config.radio.payload_size = size;
        }
    }

    // Node settings
    if let Ok(value) = env::var("NIGHTLIGHT_NODE_NAME") {
        config.node.name = value;
    }
    if let Ok(value) = env::var("NIGHTLIGHT_PERSONAL_OFFSET") {
        if let Ok(offset) = value.parse::<u8>() {
            config.node.personal_offset = Some(offset);
        }
    }
    if let Ok(value) = env::var("NIGHTLIGHT_LEGACY_COMMAND_END") {
        config.node.legacy_command_end = parse_bool(&value);
    }

    // Timing
    if let Ok(value) = env::var("NIGHTLIGHT_HELLO_INTERVAL_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.timing.hello_interval_ms = ms;
        }
    }
    if let Ok(value) = env::var("NIGHTLIGHT_CONTROL_LEASE_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.timing.control_lease_ms = ms;
        }
    }

    // Outputs
    if let Ok(value) = env::var("NIGHTLIGHT_LED_PIN") {
        if let Ok(pin) = value.parse::<u8>() {
            config.outputs.led_pin = pin;
        }
    }

    if let Ok(value) = env::var("NIGHTLIGHT_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"node_name": "porch", "personal_offset": "7"}`)
pub fn apply_cli_overrides(config: &mut NightlightConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("broadcast_address") {
        if let Some(address) = parse_address(value) {
            config.radio.broadcast_address = address;
        }
    }
    if let Some(value) = cli_args.get("node_name") {
        config.node.name = value.clone();
    }
    if let Some(value) = cli_args.get("personal_offset") {
        if let Ok(offset) = value.parse::<u8>() {
            config.node.personal_offset = Some(offset);
        }
    }
    if let Some(value) = cli_args.get("legacy_command_end") {
        config.node.legacy_command_end = parse_bool(value);
    }
    if let Some(value) = cli_args.get("hello_interval_ms") {
        if let Ok(ms) = value.parse::<u64>() {
            config.timing.hello_interval_ms = ms;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
