//! Stub Module
//!
//! A stand-in device-control process for local development and tests.
//!
//! ## Architecture
//! - Single acceptor thread polling a shutdown flag
//! - Worker thread pool fed over a channel
//! - Requests answered by an in-memory [`StubDevice`]

mod device;
mod connection;
mod server;

pub use device::StubDevice;
pub use connection::Connection;
pub use server::{ShutdownHandle, StubServer};

/// Configuration for the stub device server
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Worker threads serving connections
    pub workers: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,

    /// Close each connection after its first reply
    pub close_after_reply: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5001".to_string(),
            workers: 4,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            close_after_reply: false,
        }
    }
}
