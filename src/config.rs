//! Configuration for devlink
//!
//! Centralized configuration with sensible defaults. The upstream address is
//! read-only once built and is injected into the bridge at construction.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Main configuration for a bridge instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Gateway Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Optional directory of static UI files served for unmatched paths
    pub static_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Upstream Configuration
    // -------------------------------------------------------------------------
    /// Host of the device-control process
    pub upstream_host: String,

    /// Port of the device-control process
    pub upstream_port: u16,

    /// Per-exchange deadline (milliseconds)
    pub timeout_ms: u64,

    /// Largest reply the bridge will buffer (in bytes)
    pub max_reply_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            static_dir: None,
            upstream_host: "127.0.0.1".to_string(),
            upstream_port: 5001,
            timeout_ms: 10_000,
            max_reply_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Upstream address in `host:port` form
    pub fn upstream_addr(&self) -> String {
        format!("{}:{}", self.upstream_host, self.upstream_port)
    }

    /// Per-exchange deadline as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.upstream_host.trim().is_empty() {
            return Err(BridgeError::Config("upstream host is empty".to_string()));
        }
        if self.upstream_port == 0 {
            return Err(BridgeError::Config("upstream port must be non-zero".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(BridgeError::Config("timeout must be non-zero".to_string()));
        }
        if self.max_reply_size == 0 {
            return Err(BridgeError::Config("max reply size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Serve static files from this directory
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = Some(dir.into());
        self
    }

    /// Set the upstream host and port
    pub fn upstream(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.upstream_host = host.into();
        self.config.upstream_port = port;
        self
    }

    /// Set the per-exchange deadline (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Set the reply size limit (in bytes)
    pub fn max_reply_size(mut self, size: usize) -> Self {
        self.config.max_reply_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
