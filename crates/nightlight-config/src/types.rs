// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `nightlight.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NightlightConfig {
    pub radio: RadioConfig,
    pub node: NodeConfig,
    pub timing: TimingConfig,
    pub controller: ControllerConfig,
    pub friends: FriendsConfig,
    pub outputs: OutputsConfig,
    pub logging: LoggingConfig,
}

/// Radio air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataRate {
    #[serde(rename = "1mbps")]
    OneMbps,
    #[serde(rename = "2mbps")]
    TwoMbps,
}

/// Transmitter power amplifier level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaLevel {
    Min,
    Low,
    High,
    Max,
}

/// Radio transceiver settings, consumed once at boot
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Shared base address every node listens on
    pub broadcast_address: u64,
    /// Maximum packet size in bytes (header included)
    pub payload_size: u8,
    /// Delay between automatic retries, in 250us steps (0-15)
    pub retry_delay: u8,
    /// Number of automatic retries (0-15)
    pub retry_count: u8,
    pub data_rate: DataRate,
    pub pa_level: PaLevel,
    pub auto_ack: bool,
    pub dynamic_payloads: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            broadcast_address: 0xF0F0_F0F0_00,
            payload_size: 32,
            retry_delay: 15,
            retry_count: 15,
            data_rate: DataRate::TwoMbps,
            pa_level: PaLevel::High,
            auto_ack: true,
            dynamic_payloads: true,
        }
    }
}

/// Node identity and engine bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifying text carried in HELLO broadcasts
    pub name: String,
    /// Fixed personal offset; `None` picks one from the boot entropy
    pub personal_offset: Option<u8>,
    pub max_stack_depth: usize,
    /// Capacity of each state's serial command table
    pub max_commands: usize,
    /// Emit COMMAND_END with the colliding 0x11 code used by older deployments
    pub legacy_command_end: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "nightlight".to_string(),
            personal_offset: None,
            max_stack_depth: 8,
            max_commands: 4,
            legacy_command_end: false,
        }
    }
}

/// Behavior timing, all values in milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub hello_interval_ms: u64,
    pub friend_scan_interval_ms: u64,
    pub friend_liveness_ms: u64,
    pub blink_duration_ms: u64,
    pub blink_toggle_ms: u64,
    /// 0 disables the control lease
    pub control_lease_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hello_interval_ms: 2000,
            friend_scan_interval_ms: 1000,
            friend_liveness_ms: 5000,
            blink_duration_ms: 2000,
            blink_toggle_ms: 100,
            control_lease_ms: 30_000,
        }
    }
}

/// Operator-side settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub max_controlled: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { max_controlled: 8 }
    }
}

/// Presence tracker settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FriendsConfig {
    pub capacity: usize,
}

impl Default for FriendsConfig {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

/// Physical outputs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputsConfig {
    pub led_pin: u8,
    /// Pin is active-low
    pub led_inverted: bool,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            led_pin: 13,
            led_inverted: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Optional directory for log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
