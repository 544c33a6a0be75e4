//! Protocol codec
//!
//! Encoding and incremental decoding for the wire protocol.
//!
//! ## Wire Format
//!
//! Each message is one self-delimiting JSON object. There is no length prefix
//! and no message id, so the end of a message is found by parsing:
//!
//! ```text
//! request:  {"cmd":"read_file","filename":"ticket.sys"}
//! reply:    {"success":true,"message":"File read successfully"}\n
//! ```
//!
//! [`decode_frame`] is called on a growing buffer and tells a truncated
//! prefix ([`Frame::Incomplete`]) apart from bytes that can never become a
//! message (`Err`).

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Command, Reply};
use crate::error::{BridgeError, Result};

/// Outcome of one decode attempt over buffered bytes
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<T> {
    /// A full message; `consumed` bytes of the buffer belong to it
    Complete { value: T, consumed: usize },

    /// The buffer is empty, whitespace, or a strict prefix of a message
    Incomplete,
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(command)?)
}

/// Encode a reply to bytes, newline-terminated
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(reply)?;
    bytes.push(b'\n');
    Ok(bytes)
}

// =============================================================================
// Decoding
// =============================================================================

/// Try to decode the first message in `bytes`
///
/// Leading whitespace is skipped. Bytes after the first message are left
/// untouched; `consumed` marks where they start.
pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<Frame<T>> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<Value>();

    match stream.next() {
        None => Ok(Frame::Incomplete),
        Some(Err(e)) if e.is_eof() => Ok(Frame::Incomplete),
        Some(Err(e)) => Err(BridgeError::Decode(e.to_string())),
        Some(Ok(value)) => {
            let consumed = stream.byte_offset();
            let value = serde_json::from_value(value)
                .map_err(|e| BridgeError::Decode(e.to_string()))?;
            Ok(Frame::Complete { value, consumed })
        }
    }
}

/// Try to decode a reply from buffered bytes
pub fn decode_reply(bytes: &[u8]) -> Result<Frame<Reply>> {
    decode_frame(bytes)
}
