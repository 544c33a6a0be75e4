//! HTTP Server
//!
//! Binds the listener and serves the gateway router until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use super::{router, CommandGateway};
use crate::config::Config;
use crate::error::Result;
use crate::transport::{TcpBridge, Transport};

/// HTTP server for the bridge
pub struct HttpServer {
    listener: TcpListener,
    app: Router,
}

impl HttpServer {
    /// Validate `config`, wire the gateway to a [`TcpBridge`], bind the
    /// listen address
    pub async fn bind(config: &Config) -> Result<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(TcpBridge::new(config));
        let gateway = Arc::new(CommandGateway::new(transport, config));
        let app = router(gateway, config.static_dir.as_deref());

        let listener = TcpListener::bind(config.listen_addr.as_str()).await?;
        tracing::info!("Gateway listening on {}", listener.local_addr()?);
        tracing::info!("Upstream at {}", config.upstream_addr());

        Ok(Self { listener, app })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("Gateway stopped");
        Ok(())
    }
}
