// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Console line codec
//!
//! An operator line is `TT<sep><payload>`: two hex digits for the message
//! type, one separator character (any), then free text. `20 blink` asks the
//! firing state to switch to the `blink` mode.

use crate::protocol::{payload_from, MessageType, Payload};
use thiserror::Error;

/// Console line that can't be turned into a message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerialDecodeError {
    #[error("line {0:?} is too short to carry a type byte")]
    MissingType(String),

    #[error("invalid hex type byte in {0:?}")]
    InvalidType(String),
}

/// Decode an operator line into a type and payload
///
/// A bare `TT` gives an empty payload. Payloads longer than a packet are
/// truncated.
pub fn decode_line(line: &str) -> Result<(MessageType, Payload), SerialDecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() < 2 {
        return Err(SerialDecodeError::MissingType(line.to_string()));
    }

    let hex = match line.get(..2) {
        Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => hex,
        _ => return Err(SerialDecodeError::InvalidType(line.to_string())),
    };
    let code = u8::from_str_radix(hex, 16).map_err(|_| SerialDecodeError::InvalidType(line.to_string()))?;

    let rest = &line[2..];
    let payload = match rest.chars().next() {
        Some(separator) => &rest[separator.len_utf8()..],
        None => "",
    };

    Ok((MessageType(code), payload_from(payload.as_bytes())))
}

/// Render a message as a console line, in the same shape [`decode_line`] reads
pub fn encode_line(msg_type: MessageType, payload: &[u8]) -> String {
    if payload.is_empty() {
        format!("{:02X}", msg_type.0)
    } else {
        format!("{:02X} {}", msg_type.0, String::from_utf8_lossy(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_change_mode() {
        let (msg_type, payload) = decode_line("20 blink").unwrap();
        assert_eq!(msg_type, MessageType::CHANGE_MODE);
        assert_eq!(&payload[..], b"blink");
    }

    #[test]
    fn test_round_trip_command_start() {
        let line = encode_line(MessageType(0x11), b"hi");
        assert_eq!(line, "11 hi");
        let (msg_type, payload) = decode_line(&line).unwrap();
        assert_eq!(msg_type, MessageType(0x11));
        assert_eq!(&payload[..], b"hi");
    }

    #[test]
    fn test_any_separator_is_skipped() {
        let (_, payload) = decode_line("20:controller").unwrap();
        assert_eq!(&payload[..], b"controller");
    }

    #[test]
    fn test_type_only_line_has_empty_payload() {
        let (msg_type, payload) = decode_line("10").unwrap();
        assert_eq!(msg_type, MessageType::COMMAND_SEND);
        assert!(payload.is_empty());
        assert!(decode_line("10 ").unwrap().1.is_empty());
    }

    #[test]
    fn test_lowercase_hex() {
        assert_eq!(decode_line("0a").unwrap().0, MessageType::CONTROL_STOP);
    }

    #[test]
    fn test_short_line_rejected() {
        assert_eq!(decode_line("2"), Err(SerialDecodeError::MissingType("2".to_string())));
        assert!(matches!(decode_line("\r\n"), Err(SerialDecodeError::MissingType(_))));
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(matches!(decode_line("zz blink"), Err(SerialDecodeError::InvalidType(_))));
        assert!(matches!(decode_line("+1 x"), Err(SerialDecodeError::InvalidType(_))));
        assert!(matches!(decode_line("é1"), Err(SerialDecodeError::InvalidType(_))));
    }

    #[test]
    fn test_long_payload_truncated() {
        let line = format!("18 {}", "x".repeat(60));
        let (_, payload) = decode_line(&line).unwrap();
        assert_eq!(payload.len(), crate::protocol::MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode_line(MessageType::COMMAND_END, b""), "12");
    }
}
