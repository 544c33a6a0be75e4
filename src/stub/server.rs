//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use super::{Connection, StubConfig, StubDevice};
use crate::error::Result;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// Flag that stops a running [`StubServer`]
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the server to stop accepting and wind down
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// TCP server for the stub device
pub struct StubServer {
    config: StubConfig,
    device: Arc<StubDevice>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl StubServer {
    /// Bind the listen address
    pub fn bind(config: StubConfig, device: Arc<StubDevice>) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr.as_str())?;
        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            device,
            listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops this server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shutdown)
    pub fn run(self) -> Result<()> {
        let workers = self.config.workers.max(1);
        let (tx, rx) = channel::bounded::<TcpStream>(workers * 4);

        let handles = (0..workers)
            .map(|id| {
                let rx = rx.clone();
                let device = Arc::clone(&self.device);
                let config = self.config.clone();
                thread::Builder::new()
                    .name(format!("stub-worker-{}", id))
                    .spawn(move || worker_loop(rx, device, config))
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        drop(rx);

        tracing::info!(
            "Stub device listening on {} with {} workers",
            self.listener.local_addr()?,
            workers
        );

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted {}", addr);
                    // Accepted sockets may inherit non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping {}: {}", addr, e);
                        continue;
                    }
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        drop(tx);
        for handle in handles {
            let _ = handle.join();
        }

        tracing::info!("Stub device stopped");
        Ok(())
    }
}

fn worker_loop(rx: Receiver<TcpStream>, device: Arc<StubDevice>, config: StubConfig) {
    for stream in rx.iter() {
        let mut connection = match Connection::new(stream, Arc::clone(&device), config.close_after_reply) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                continue;
            }
        };

        if let Err(e) = connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms) {
            tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
            continue;
        }

        if let Err(e) = connection.handle() {
            tracing::warn!("Connection {} ended with error: {}", connection.peer_addr(), e);
        }
    }
}
