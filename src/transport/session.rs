//! Exchange Session
//!
//! The connection, accumulation buffer and deadline of one outstanding
//! command.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::error::{BridgeError, Result};
use crate::protocol::{decode_reply, encode_command, Command, Frame, Reply};

/// Initial buffer capacity; replies are usually a single small object
const INITIAL_BUFFER: usize = 4096;

/// State of a single command/reply exchange
///
/// A session is consumed by [`Session::exchange`], so its connection is
/// released exactly once whichever way the exchange ends.
pub(crate) struct Session {
    /// Connection to the upstream
    stream: TcpStream,

    /// Bytes received so far (append-only)
    buffer: BytesMut,

    /// Point after which the exchange is abandoned
    deadline: Instant,

    /// Deadline length, for error reporting
    timeout_ms: u64,

    /// Largest reply we are willing to buffer
    max_reply_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Session {
    /// Connect to the upstream
    ///
    /// The deadline starts before the connect attempt, so connecting and the
    /// exchange share one `timeout`.
    pub(crate) async fn open(addr: &str, timeout: Duration, max_reply_size: usize) -> Result<Self> {
        let timeout_ms = timeout.as_millis() as u64;
        let deadline = Instant::now() + timeout;

        let stream = match time::timeout_at(deadline, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(BridgeError::Connection(format!(
                    "cannot connect to {}: {}",
                    addr, e
                )))
            }
            Err(_) => return Err(BridgeError::Timeout(timeout_ms)),
        };

        // Disable Nagle's algorithm; requests are a single small write
        stream.set_nodelay(true)?;

        tracing::debug!("Session opened to {}", addr);

        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER),
            deadline,
            timeout_ms,
            max_reply_size,
            peer_addr: addr.to_string(),
        })
    }

    /// Send the command, wait for one reply, close the connection
    pub(crate) async fn exchange(mut self, command: &Command) -> Result<Reply> {
        let deadline = self.deadline;
        let raced = time::timeout_at(deadline, self.round_trip(command)).await;

        let outcome = match raced {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    "Deadline reached for {} with {} bytes buffered",
                    self.peer_addr,
                    self.buffer.len()
                );
                Err(BridgeError::Timeout(self.timeout_ms))
            }
        };

        self.close().await;
        outcome
    }

    /// Write the request, then accumulate until a reply decodes
    async fn round_trip(&mut self, command: &Command) -> Result<Reply> {
        let request = encode_command(command)?;
        self.stream.write_all(&request).await.map_err(|e| {
            BridgeError::Connection(format!("write to {} failed: {}", self.peer_addr, e))
        })?;

        loop {
            let read = self.stream.read_buf(&mut self.buffer).await.map_err(|e| {
                BridgeError::Connection(format!("read from {} failed: {}", self.peer_addr, e))
            })?;

            if read == 0 {
                return self.decode_at_close();
            }

            tracing::trace!(
                "Read {} bytes from {} ({} buffered)",
                read,
                self.peer_addr,
                self.buffer.len()
            );

            match decode_reply(&self.buffer)? {
                Frame::Complete { value, consumed } => {
                    if consumed < self.buffer.len() {
                        tracing::trace!(
                            "Ignoring {} bytes after reply from {}",
                            self.buffer.len() - consumed,
                            self.peer_addr
                        );
                    }
                    return Ok(value);
                }
                Frame::Incomplete if self.buffer.len() > self.max_reply_size => {
                    return Err(BridgeError::Decode(format!(
                        "reply exceeds {} bytes",
                        self.max_reply_size
                    )));
                }
                Frame::Incomplete => {}
            }
        }
    }

    /// Last decode attempt once the peer has ended the stream
    fn decode_at_close(&self) -> Result<Reply> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(BridgeError::Decode(
                "connection closed without a reply".to_string(),
            ));
        }

        match decode_reply(&self.buffer)? {
            Frame::Complete { value, .. } => Ok(value),
            Frame::Incomplete => Err(BridgeError::Decode(format!(
                "connection closed after {} bytes of an incomplete reply",
                self.buffer.len()
            ))),
        }
    }

    /// Release the connection
    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!("Shutdown of {} reported: {}", self.peer_addr, e);
        }
        tracing::debug!("Session to {} closed", self.peer_addr);
    }
}
