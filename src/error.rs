//! Error types for devlink
//!
//! Provides a unified error type for all operations, and the coarse
//! [`ErrorKind`] that clients see in response envelopes.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type for devlink operations
#[derive(Debug, Error)]
pub enum BridgeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    /// Client-supplied input was rejected before reaching the upstream
    #[error("{0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection timeout after {0} ms")]
    Timeout(u64),

    #[error("Invalid response from upstream: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl BridgeError {
    /// The client-facing category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Validation(_) | BridgeError::Config(_) => ErrorKind::Validation,
            BridgeError::Io(_) | BridgeError::Connection(_) => ErrorKind::Connection,
            BridgeError::Timeout(_) => ErrorKind::Timeout,
            BridgeError::Decode(_) | BridgeError::Serialization(_) => ErrorKind::Decode,
        }
    }
}

/// Failure category carried in the `error_kind` field of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing client parameter; the upstream was never contacted
    Validation,

    /// Upstream refused, unreachable, or dropped the connection mid-exchange
    Connection,

    /// No complete reply before the deadline
    Timeout,

    /// Bytes arrived but never formed a well-formed reply
    Decode,
}
