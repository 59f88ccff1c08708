// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Nightlight
//!
//! Cooperative runtime for small radio nodes that blink on command. Each node
//! runs a stack of states; events enter at the top and bubble down until one
//! claims them.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! nightlight = "0.3"  # Default: sim platform
//! ```
//!
//! ## Feature Flags
//!
//! ### Platform Targets
//! - **`sim`** (default): in-memory ether, virtual clock, scripted console
//! - **`std-host`**: wall clock, stdin/stdout console, OS entropy
//!
//! ### Optional Layers
//! - **`observability`**: logging setup and per-crate debug flags
//! - **`config-loader`**: `nightlight.toml` discovery and overrides
//!
//! ## Usage
//!
//! ```rust
//! use nightlight::prelude::*;
//!
//! let ether = Ether::new();
//! let config = NightlightConfig::default();
//! let serial = SimSerial::new();
//! let (mut node, states, _) = standard_node(
//!     ether.radio(),
//!     serial.clone(),
//!     VirtualClock::new(),
//!     SimGpio::new(),
//!     &mut FixedEntropy(7),
//!     &config,
//! )?;
//!
//! serial.push_line("20 blink");
//! node.tick()?;
//! assert_eq!(node.engine().stack().last(), Some(&states.blinky));
//! # Ok::<(), nightlight::runtime::NodeError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: nightlight-config, nightlight-hal          │
//! │  (settings, radio/serial/GPIO/clock capabilities)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Runtime: nightlight-core                               │
//! │  (framing, command tables, timers, state stack, node)   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Behaviors: nightlight-behaviors                        │
//! │  (discovery, remote control, presence, blinking)        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub use nightlight_behaviors as behaviors;
pub use nightlight_config as config;
pub use nightlight_core as runtime;
pub use nightlight_hal as hal;

#[cfg(feature = "observability")]
pub use nightlight_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use nightlight_behaviors::{
        standard_node, BlinkyLight, ControlledNode, ControllerState, FriendList, NodeState, OpenNode, StandardNode,
        StandardStates,
    };
    pub use nightlight_config::NightlightConfig;
    pub use nightlight_core::prelude::*;
    pub use nightlight_hal::prelude::*;
}
