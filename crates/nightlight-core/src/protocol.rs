// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Radio wire format
//!
//! ```text
//! +--------+--------+------------------------+
//! | type   | sender | payload (0..=30 bytes) |
//! +--------+--------+------------------------+
//!   byte 0   byte 1   length from the transport
//! ```
//!
//! The sender byte is the transmitting node's personal offset. There is no
//! length field; the transport reports how many bytes arrived.

use core::fmt;
use heapless::Vec;
use std::borrow::Cow;
use thiserror::Error;

/// Header bytes in front of every payload (type + sender)
pub const HEADER_SIZE: usize = 2;

/// Largest packet on the air
pub const MAX_PACKET_SIZE: usize = nightlight_hal::MAX_PACKET_SIZE;

/// Largest payload a packet can carry
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// Message payload buffer
pub type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Encoded packet buffer
pub type PacketBytes = Vec<u8, MAX_PACKET_SIZE>;

/// One-byte message type code
///
/// Unknown codes are carried through unchanged; states simply don't claim them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(pub u8);

impl MessageType {
    pub const HELLO: Self = Self(0x01);
    pub const APPEAR: Self = Self(0x02);
    pub const DISAPPEAR: Self = Self(0x03);
    pub const CONTROL_REQUEST: Self = Self(0x08);
    pub const CONTROL_START: Self = Self(0x09);
    pub const CONTROL_STOP: Self = Self(0x0A);
    pub const COMMAND_SEND: Self = Self(0x10);
    pub const COMMAND_START: Self = Self(0x11);
    pub const COMMAND_END: Self = Self(0x12);
    pub const EVENT: Self = Self(0x18);
    pub const CHANGE_MODE: Self = Self(0x20);

    /// Protocol name of a known code
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::HELLO => "HELLO",
            Self::APPEAR => "APPEAR",
            Self::DISAPPEAR => "DISAPPEAR",
            Self::CONTROL_REQUEST => "CONTROL_REQUEST",
            Self::CONTROL_START => "CONTROL_START",
            Self::CONTROL_STOP => "CONTROL_STOP",
            Self::COMMAND_SEND => "COMMAND_SEND",
            Self::COMMAND_START => "COMMAND_START",
            Self::COMMAND_END => "COMMAND_END",
            Self::EVENT => "EVENT",
            Self::CHANGE_MODE => "CHANGE_MODE",
            _ => return None,
        })
    }

    /// Code put on the air for this type
    ///
    /// Deployed nodes of the last protocol revision send `COMMAND_END` as
    /// `0x11`; `legacy` reproduces that. A received `0x11` is always
    /// `COMMAND_START`.
    pub fn on_wire(self, legacy: bool) -> Self {
        if legacy && self == Self::COMMAND_END {
            Self::COMMAND_START
        } else {
            self
        }
    }
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl From<MessageType> for u8 {
    fn from(msg_type: MessageType) -> Self {
        msg_type.0
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "MessageType({:#04x})", self.0),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}

/// Where a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    /// A node on the radio, by personal offset (our own offset for loopback)
    Radio(u8),
    /// The operator console
    Serial,
    /// An event a state raised for the rest of this node's stack
    Local,
}

impl Sender {
    /// Radio offset, if the message came over the radio or loopback
    pub fn offset(self) -> Option<u8> {
        match self {
            Sender::Radio(offset) => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Radio(offset) => write!(f, "{:02X}", offset),
            Sender::Serial => f.write_str("serial"),
            Sender::Local => f.write_str("local"),
        }
    }
}

/// Where an outgoing message goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Every listening node
    Broadcast,
    /// One node by personal offset; `Node(0)` is the broadcast address
    Node(u8),
    /// The operator console, as a text line
    Serial,
}

impl From<Sender> for Destination {
    /// Reply address for a sender
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Radio(offset) => Destination::Node(offset),
            Sender::Serial | Sender::Local => Destination::Serial,
        }
    }
}

/// Copy at most [`MAX_PAYLOAD_SIZE`] bytes into a payload buffer
pub fn payload_from(bytes: &[u8]) -> Payload {
    let len = bytes.len().min(MAX_PAYLOAD_SIZE);
    // Length is capped to the buffer capacity above
    Payload::from_slice(&bytes[..len]).unwrap_or_default()
}

/// A dispatched event: radio packet, console command, loopback or local event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub msg_type: MessageType,
    pub payload: Payload,
}

impl Message {
    /// Build a message, truncating the payload to [`MAX_PAYLOAD_SIZE`]
    pub fn new(sender: Sender, msg_type: MessageType, payload: &[u8]) -> Self {
        Self {
            sender,
            msg_type,
            payload: payload_from(payload),
        }
    }

    /// Payload as text (lossy)
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// First payload byte, used as the subject address of APPEAR/DISAPPEAR
    pub fn subject(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Check the type and sender together
    pub fn is(&self, msg_type: MessageType, sender: Sender) -> bool {
        self.msg_type == msg_type && self.sender == sender
    }
}

/// Packet framing errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("packet of {0} bytes is shorter than the 2-byte header")]
    TooShort(usize),

    #[error("packet of {0} bytes exceeds the 32-byte limit")]
    TooLong(usize),
}

/// Decoded radio packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub msg_type: MessageType,
    pub sender: u8,
    pub payload: Payload,
}

impl Packet {
    /// Packet from parts, truncating the payload to [`MAX_PAYLOAD_SIZE`]
    pub fn new(msg_type: MessageType, sender: u8, payload: &[u8]) -> Self {
        Self {
            msg_type,
            sender,
            payload: payload_from(payload),
        }
    }

    /// Serialize to wire format
    pub fn encode(&self) -> PacketBytes {
        let mut bytes = PacketBytes::new();
        // Header + capped payload never exceeds MAX_PACKET_SIZE
        let _ = bytes.push(self.msg_type.0);
        let _ = bytes.push(self.sender);
        let _ = bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse wire bytes as reported by the transport
    ///
    /// Exactly [`HEADER_SIZE`] bytes gives an empty payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_PACKET_SIZE {
            return Err(FrameError::TooLong(bytes.len()));
        }
        Ok(Self::new(MessageType(bytes[0]), bytes[1], &bytes[HEADER_SIZE..]))
    }

    /// Convert to a dispatchable message from the radio
    pub fn into_message(self) -> Message {
        Message {
            sender: Sender::Radio(self.sender),
            msg_type: self.msg_type,
            payload: self.payload,
        }
    }
}
