//! Response envelope
//!
//! The one response shape every gateway operation produces.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BridgeError, ErrorKind};
use crate::protocol::Reply;

/// Uniform client-facing result
///
/// `error_kind` is present only when the failure came from the bridge itself
/// (validation, connection, timeout, decode). A device that replies with
/// `success: false` yields an envelope without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl Envelope {
    /// Successful envelope with a message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error_kind: None,
        }
    }

    /// Failure envelope for a bridge error
    pub fn from_error(err: &BridgeError) -> Self {
        Self {
            success: false,
            message: Some(err.to_string()),
            data: None,
            error_kind: Some(err.kind()),
        }
    }

    /// Replace the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a data payload
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<Reply> for Envelope {
    fn from(reply: Reply) -> Self {
        Self {
            success: reply.success,
            message: reply.message,
            data: reply.data,
            error_kind: None,
        }
    }
}
