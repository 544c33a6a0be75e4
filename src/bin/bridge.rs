//! devlink Bridge Binary
//!
//! Starts the HTTP gateway in front of a device-control process.

use std::path::PathBuf;

use clap::Parser;
use devlink::{Config, HttpServer};
use tracing_subscriber::{fmt, EnvFilter};

/// devlink Bridge
#[derive(Parser, Debug)]
#[command(name = "devlink-bridge")]
#[command(about = "HTTP bridge to a device-control process")]
#[command(version)]
struct Args {
    /// HTTP listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Device-control process host
    #[arg(long, default_value = "127.0.0.1")]
    upstream_host: String,

    /// Device-control process port
    #[arg(long, default_value = "5001")]
    upstream_port: u16,

    /// Per-command deadline in milliseconds
    #[arg(short, long, default_value = "10000")]
    timeout_ms: u64,

    /// Directory of static UI files to serve
    #[arg(short, long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,devlink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("devlink bridge v{}", devlink::VERSION);

    // Build config from args
    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .upstream(&args.upstream_host, args.upstream_port)
        .timeout_ms(args.timeout_ms);
    if let Some(dir) = &args.static_dir {
        builder = builder.static_dir(dir);
    }
    let config = builder.build();

    let server = match HttpServer::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start gateway: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Gateway error: {}", e);
        std::process::exit(1);
    }
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}
