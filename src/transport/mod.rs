//! Transport Module
//!
//! Carries one command to the device-control process and brings back one
//! reply.
//!
//! ## Architecture
//! - One TCP connection per command, closed after the reply
//! - Replies are framed by decoding, not by length or delimiter
//! - A single deadline bounds every exchange

mod session;
mod bridge;

pub use bridge::TcpBridge;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{Command, Reply};

/// Executes commands against the upstream
///
/// Implementations fail only with `Connection`, `Timeout` or `Decode`
/// errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one command to completion
    async fn execute(&self, command: Command) -> Result<Reply>;
}
