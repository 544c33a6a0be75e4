//! Command Gateway
//!
//! One operation per client-facing command. Each operation validates its
//! input, calls the transport at most once, and folds the outcome into an
//! [`Envelope`].

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::Envelope;
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::protocol::{Command, CommandName, Reply};
use crate::transport::Transport;

/// Indicator value used when the client does not supply one
pub const DEFAULT_INDICATOR: &str = "1";

/// Maps client operations onto upstream commands
pub struct CommandGateway {
    /// Transport used for every upstream call
    transport: Arc<dyn Transport>,

    /// Reported by `status`
    upstream_host: String,
    upstream_port: u16,
}

impl CommandGateway {
    /// Create a gateway over `transport`
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            upstream_host: config.upstream_host.clone(),
            upstream_port: config.upstream_port,
        }
    }

    // =========================================================================
    // Local Operations
    // =========================================================================

    /// Bridge liveness; never contacts the upstream
    pub fn status(&self) -> Envelope {
        let mut data = Map::new();
        data.insert("upstream_host".to_string(), json!(self.upstream_host));
        data.insert("upstream_port".to_string(), json!(self.upstream_port));
        Envelope::ok("Bridge server running").with_data(data)
    }

    // =========================================================================
    // Upstream Operations
    // =========================================================================

    /// Upstream liveness probe
    pub async fn ping(&self) -> Envelope {
        match self.forward(Command::new(CommandName::Ping)).await {
            Ok(reply) => reply.into(),
            Err(e) => Envelope::from_error(&e).with_message(format!(
                "Cannot reach upstream: {}. Is the device-control process running?",
                e
            )),
        }
    }

    /// Whether the upstream currently holds a device connection
    pub async fn connection(&self) -> Envelope {
        match self.forward(Command::new(CommandName::Status)).await {
            Ok(reply) => reply.into(),
            Err(e) => {
                let mut data = Map::new();
                data.insert("connected".to_string(), Value::Bool(false));
                Envelope::from_error(&e).with_data(data)
            }
        }
    }

    pub async fn connect(&self) -> Envelope {
        self.simple(CommandName::Init).await
    }

    pub async fn disconnect(&self) -> Envelope {
        self.simple(CommandName::Close).await
    }

    /// Fetch the device identifier
    pub async fn identifier(&self) -> Envelope {
        self.simple(CommandName::GetIdentifier).await
    }

    pub async fn list_files(&self) -> Envelope {
        self.simple(CommandName::ListFiles).await
    }

    pub async fn dump_nand(&self) -> Envelope {
        self.simple(CommandName::DumpNand).await
    }

    pub async fn dump_filesystem(&self) -> Envelope {
        self.simple(CommandName::DumpFs).await
    }

    /// Read one file; `filename` is required and must be non-empty
    pub async fn read_file(&self, filename: Option<&str>) -> Envelope {
        let filename = match filename.filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => {
                return Envelope::from_error(&BridgeError::Validation(
                    "Filename required".to_string(),
                ))
            }
        };

        fold(self.forward(Command::read_file(filename)).await)
    }

    /// Set the device indicator; a missing or empty value falls back to
    /// [`DEFAULT_INDICATOR`]
    pub async fn set_indicator(&self, value: Option<&str>) -> Envelope {
        let value = value
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_INDICATOR);

        fold(self.forward(Command::set_indicator(value)).await)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn simple(&self, name: CommandName) -> Envelope {
        fold(self.forward(Command::new(name)).await)
    }

    async fn forward(&self, command: Command) -> Result<Reply> {
        self.transport.execute(command).await
    }
}

/// Fold a transport outcome into an envelope
fn fold(result: Result<Reply>) -> Envelope {
    match result {
        Ok(reply) => reply.into(),
        Err(e) => Envelope::from_error(&e),
    }
}
