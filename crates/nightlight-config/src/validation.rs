// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Stack depth and command-table capacity are static bounds: a node that
//! would overflow them is misconfigured, so they are rejected here at startup
//! rather than discovered while handling traffic.

use crate::{ConfigError, ConfigResult, NightlightConfig};

/// Wire header: one type byte plus one sender byte.
pub const PACKET_HEADER_SIZE: u8 = 2;

/// Largest packet the transceiver can carry.
pub const MAX_PACKET_SIZE: u8 = 32;

/// States the default wiring can keep on the stack at once. A state is
/// never pushed twice, so this is one slot each for FriendList, OpenNode,
/// ControlledNode, BlinkyLight and ControllerState.
pub const MIN_STACK_DEPTH: usize = 5;

/// Modes OpenNode registers in its command table.
pub const BUILTIN_MODES: usize = 2;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: u64, min: u64, max: u64 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, value, min, max } => {
                write!(f, "{} = {} is outside valid range ({}-{})", field, value, min, max)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Radio parameter ranges
/// - Engine bounds large enough for the built-in behaviors
/// - Non-zero timing intervals
/// - Required fields
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NightlightConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_radio(config, &mut errors);
    validate_engine_bounds(config, &mut errors);
    validate_timing(config, &mut errors);
    validate_required_fields(config, &mut errors);

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

    Ok(())
}

fn check_range(
    field: &str,
    value: u64,
    min: u64,
    max: u64,
    errors: &mut Vec<ConfigValidationError>,
) {
    if value < min || value > max {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

fn validate_radio(config: &NightlightConfig, errors: &mut Vec<ConfigValidationError>) {
    let radio = &config.radio;
    check_range(
        "radio.payload_size",
        radio.payload_size as u64,
        PACKET_HEADER_SIZE as u64 + 1,
        MAX_PACKET_SIZE as u64,
        errors,
    );
    check_range("radio.retry_delay", radio.retry_delay as u64, 0, 15, errors);
    check_range("radio.retry_count", radio.retry_count as u64, 0, 15, errors);

    // Personal addresses are broadcast + 0..=255 and must not wrap
    if radio.broadcast_address.checked_add(255).is_none() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "radio.broadcast_address".to_string(),
            reason: "no room for 256 personal addresses above it".to_string(),
        });
    }
}

fn validate_engine_bounds(config: &NightlightConfig, errors: &mut Vec<ConfigValidationError>) {
    check_range(
        "node.max_stack_depth",
        config.node.max_stack_depth as u64,
        MIN_STACK_DEPTH as u64,
        64,
        errors,
    );
    check_range(
        "node.max_commands",
        config.node.max_commands as u64,
        BUILTIN_MODES as u64,
        32,
        errors,
    );
    check_range("controller.max_controlled", config.controller.max_controlled as u64, 1, 255, errors);
    check_range("friends.capacity", config.friends.capacity as u64, 1, 256, errors);
}

fn validate_timing(config: &NightlightConfig, errors: &mut Vec<ConfigValidationError>) {
    let timing = &config.timing;
    let intervals = [
        ("timing.hello_interval_ms", timing.hello_interval_ms),
        ("timing.friend_scan_interval_ms", timing.friend_scan_interval_ms),
        ("timing.friend_liveness_ms", timing.friend_liveness_ms),
        ("timing.blink_duration_ms", timing.blink_duration_ms),
        ("timing.blink_toggle_ms", timing.blink_toggle_ms),
    ];
    for (field, value) in intervals {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }

    if timing.friend_liveness_ms != 0 && timing.friend_liveness_ms < timing.hello_interval_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "timing.friend_liveness_ms".to_string(),
            reason: "shorter than timing.hello_interval_ms, friends would flap".to_string(),
        });
    }
}

fn validate_required_fields(config: &NightlightConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.node.name.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "node.name".to_string(),
        });
    }

    let capacity = config.radio.payload_size.saturating_sub(PACKET_HEADER_SIZE) as usize;
    if config.node.name.len() > capacity {
        errors.push(ConfigValidationError::InvalidValue {
            field: "node.name".to_string(),
            reason: format!("longer than the {} byte HELLO payload", capacity),
        });
    }

    if config.logging.level.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.level".to_string(),
        });
    }
}
