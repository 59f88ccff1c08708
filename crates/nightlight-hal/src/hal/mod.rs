// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hardware Abstraction Layer (HAL) trait definitions
//!
//! This module defines platform-agnostic traits that each platform
//! implements to provide:
//! - Monotonic time (TimeProvider)
//! - Packet radio (RadioProvider)
//! - Line-oriented console (SerialIO)
//! - Binary outputs (GpioProvider)
//! - Boot-time randomness (EntropySource)

/// Boot-time unpredictable seed.
pub mod entropy;
/// General-purpose I/O abstractions for pins.
pub mod gpio;
/// Packet radio transceiver traits.
pub mod radio;
/// Line-oriented serial console traits.
pub mod serial;
/// Timekeeping abstractions (monotonic clock, delays).
pub mod time;

// Re-export trait types
pub use entropy::EntropySource;
pub use gpio::GpioProvider;
pub use radio::{DataRate, PaLevel, RadioProvider, RadioSettings, MAX_PACKET_SIZE};
pub use serial::{SerialIO, MAX_LINE_LENGTH};
pub use time::TimeProvider;
