//! Connection Handler
//!
//! Handles individual bridge connections to the stub device.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use serde_json::{Map, Value};

use super::StubDevice;
use crate::error::{BridgeError, Result};
use crate::protocol::{decode_frame, encode_reply, Frame, Reply};

/// Largest request the stub will buffer
const MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Handles a single bridge connection
pub struct Connection {
    /// TCP stream
    stream: TcpStream,

    /// Bytes received but not yet decoded
    buffer: BytesMut,

    /// Device answering the requests
    device: Arc<StubDevice>,

    /// Close after the first reply instead of waiting for more requests
    close_after_reply: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, device: Arc<StubDevice>, close_after_reply: bool) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            device,
            close_after_reply,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies.
    /// Returns when the peer disconnects, goes idle past the read timeout,
    /// or sends something that is not a request.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match self.read_request() {
                Ok(Some(request)) => request,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(BridgeError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(BridgeError::Decode(reason)) => {
                    tracing::warn!("Malformed request from {}: {}", self.peer_addr, reason);
                    let _ = self.send_reply(&Reply::failure("Malformed request"));
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let reply = self.device.handle(&request);

            if let Err(e) = self.send_reply(&reply) {
                if let BridgeError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if self.close_after_reply {
                return Ok(());
            }
        }
    }

    /// Read until one full request object is buffered
    ///
    /// Returns `None` when the peer closes between requests.
    fn read_request(&mut self) -> Result<Option<Map<String, Value>>> {
        let mut chunk = [0u8; 4096];

        loop {
            if let Frame::Complete { value, consumed } = decode_frame(&self.buffer)? {
                self.buffer.advance(consumed);
                return Ok(Some(value));
            }

            let read = self.stream.read(&mut chunk)?;
            if read == 0 {
                if self.buffer.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                return Err(BridgeError::Decode(format!(
                    "connection closed mid-request after {} bytes",
                    self.buffer.len()
                )));
            }

            self.buffer.extend_from_slice(&chunk[..read]);
            if self.buffer.len() > MAX_REQUEST_SIZE {
                return Err(BridgeError::Decode(format!(
                    "request exceeds {} bytes",
                    MAX_REQUEST_SIZE
                )));
            }
        }
    }

    /// Send a reply to the client
    fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        let bytes = encode_reply(reply)?;
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Errors that mean the peer is gone or idle rather than a server fault
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            // Read timeout (Windows reports TimedOut instead of WouldBlock)
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
