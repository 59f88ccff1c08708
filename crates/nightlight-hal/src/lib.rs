// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Nightlight HAL
//!
//! Capability traits for the collaborators a nightlight node talks to, and
//! concrete platforms implementing them.
//!
//! This crate provides:
//! - **HAL traits** (`hal` module) - radio, serial console, GPIO, clock, entropy
//! - **Platform implementations** (`platforms` module) - a deterministic
//!   simulator and a host (desktop) platform
//!
//! ## Usage
//!
//! ```no_run
//! use nightlight_hal::prelude::*;
//!
//! let clock = VirtualClock::new();
//! let ether = Ether::new();
//! let mut radio = ether.radio();
//! radio.configure(&RadioSettings::new(0xF0F0F0F000, 0xF0F0F0F007));
//! clock.advance(100);
//! assert_eq!(clock.now_ms(), 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `sim` (default) - in-memory ether, virtual clock, scripted serial, recording GPIO
//! - `std-host` - system clock, stdin/stdout console, OS entropy

/// Hardware abstraction traits shared by all platforms.
pub mod hal;

/// Concrete platform implementations.
pub mod platforms;

// Re-export commonly used types
pub use hal::{
    DataRate, EntropySource, GpioProvider, PaLevel, RadioProvider, RadioSettings, SerialIO,
    TimeProvider, MAX_LINE_LENGTH, MAX_PACKET_SIZE,
};

#[cfg(feature = "sim")]
pub use platforms::sim::{
    Ether, FixedEntropy, SimGpio, SimRadio, SimSerial, Transmission, VirtualClock, SIM_LOG_CAPACITY,
};

#[cfg(feature = "std-host")]
pub use platforms::host::{OsEntropy, StdioSerial, SystemClock};

/// Prelude module for convenient imports
///
/// ```no_run
/// use nightlight_hal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::hal::*;

    #[cfg(feature = "sim")]
    pub use crate::platforms::sim::*;

    #[cfg(feature = "std-host")]
    pub use crate::platforms::host::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
