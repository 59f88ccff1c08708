// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Nightlight Core
//!
//! Runtime shared by every nightlight node:
//! - **protocol** - message types, senders, radio packet framing
//! - **serial** - operator console line codec
//! - **address** - node identity on the radio
//! - **command_table** - bounded mode-name lookup
//! - **timer** - one-shot absolute deadlines
//! - **engine** - the state stack and bubbling dispatch
//! - **node** - the scheduler tying the engine to radio, console, clock and outputs
//!
//! Concrete behaviors live in `nightlight-behaviors`; hardware access goes
//! through the `nightlight-hal` traits.
//!
//! ## Example
//!
//! ```rust
//! use nightlight_core::prelude::*;
//!
//! struct Quiet;
//!
//! impl Behavior for Quiet {
//!     fn name(&self) -> &'static str {
//!         "quiet"
//!     }
//! }
//!
//! let mut engine = StateStack::new(NodeIdentity::new(0xF0F0F0F000, 7), 8, 4);
//! let quiet = engine.register(Quiet);
//! engine.push(quiet).unwrap();
//! assert!(!engine.dispatch(Message::new(Sender::Radio(3), MessageType::HELLO, b"hi")));
//! ```

pub mod address;
pub mod command_table;
pub mod engine;
pub mod error;
pub mod node;
pub mod protocol;
pub mod serial;
pub mod timer;

pub use address::NodeIdentity;
pub use command_table::{CommandTable, CommandTableFull};
pub use engine::{Behavior, Context, Effect, StateId, StateStack, MAX_LOCAL_CHAIN};
pub use error::{EngineError, NodeError};
pub use node::{Node, TickReport};
pub use protocol::{
    Destination, FrameError, Message, MessageType, Packet, Payload, Sender, HEADER_SIZE, MAX_PACKET_SIZE,
    MAX_PAYLOAD_SIZE,
};
pub use serial::{decode_line, encode_line, SerialDecodeError};
pub use timer::Timeout;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::address::NodeIdentity;
    pub use crate::engine::{Behavior, Context, StateId, StateStack};
    pub use crate::error::{EngineError, NodeError};
    pub use crate::node::{Node, TickReport};
    pub use crate::protocol::{Destination, Message, MessageType, Sender};
}
