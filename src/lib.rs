//! # devlink
//!
//! An HTTP bridge to a device-control process with:
//! - One TCP connection per command, closed after the reply
//! - Reply framing by incremental JSON decoding (no length prefix, no ids)
//! - A bounded deadline on every exchange
//! - A uniform JSON envelope for every outcome
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Gateway (axum)                      │
//! │                  (Many concurrent clients)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  validate, build Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Command Gateway                          │
//! │             (one transport call, one Envelope)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Transport Bridge                         │
//! │      connect → write → accumulate/decode → close             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  TCP, one JSON object each way
//!               ┌───────▼────────┐
//!               │ Device-control │
//!               │    process     │
//!               └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod gateway;
pub mod stub;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BridgeError, ErrorKind, Result};
pub use config::Config;
pub use gateway::{CommandGateway, Envelope, HttpServer};
pub use transport::{TcpBridge, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of devlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
