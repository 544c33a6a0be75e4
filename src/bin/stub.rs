//! devlink Stub Device Binary
//!
//! Runs an in-memory device-control process for local development.

use std::sync::Arc;

use clap::Parser;
use devlink::stub::{ShutdownHandle, StubConfig, StubDevice, StubServer};
use tracing_subscriber::{fmt, EnvFilter};

/// devlink Stub Device
#[derive(Parser, Debug)]
#[command(name = "devlink-stub")]
#[command(about = "Stand-in device-control process")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5001")]
    listen: String,

    /// Worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Close each connection after its first reply
    #[arg(long)]
    close_after_reply: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,devlink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("devlink stub device v{}", devlink::VERSION);

    let config = StubConfig {
        listen_addr: args.listen,
        workers: args.workers,
        close_after_reply: args.close_after_reply,
        ..StubConfig::default()
    };

    let server = match StubServer::bind(config, Arc::new(StubDevice::default())) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    ctrlc_handler(server.shutdown_handle());

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Stop the server on Ctrl+C
fn ctrlc_handler(handle: ShutdownHandle) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Ctrl+C handler unavailable: {}", e);
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
            handle.shutdown();
        }
    });
}
