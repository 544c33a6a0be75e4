//! TCP Bridge
//!
//! The production [`Transport`]: a fresh [`Session`] per command.

use std::time::Duration;

use async_trait::async_trait;

use super::session::Session;
use super::Transport;
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, Reply};

/// Transport to a device-control process at a fixed address
///
/// Holds only read-only settings, so one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct TcpBridge {
    upstream_addr: String,
    timeout: Duration,
    max_reply_size: usize,
}

impl TcpBridge {
    /// Create a bridge from the upstream settings in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            upstream_addr: config.upstream_addr(),
            timeout: config.timeout(),
            max_reply_size: config.max_reply_size,
        }
    }
}

#[async_trait]
impl Transport for TcpBridge {
    async fn execute(&self, command: Command) -> Result<Reply> {
        tracing::debug!("Sending to upstream {}: {}", self.upstream_addr, command.name());

        let opened = Session::open(&self.upstream_addr, self.timeout, self.max_reply_size).await;
        let result = match opened {
            Ok(session) => session.exchange(&command).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(reply) => tracing::debug!(
                "Reply to {} from {}: success={}",
                command.name(),
                self.upstream_addr,
                reply.success
            ),
            Err(e) => tracing::warn!(
                "Command {} to {} failed: {}",
                command.name(),
                self.upstream_addr,
                e
            ),
        }

        result
    }
}
