//! fileshare Server Binary
//!
//! Shares a folder over TCP.

use clap::Parser;
use fileshare::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// fileshare Server
#[derive(Parser, Debug)]
#[command(name = "fileshare-server")]
#[command(about = "Share a folder over TCP")]
#[command(version)]
struct Args {
    /// Folder to share
    #[arg(short, long)]
    shared_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:1234")]
    listen: String,

    /// Connections served at the same time
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Accepted connections allowed to wait for a worker
    #[arg(short, long, default_value = "128")]
    pending: usize,

    /// Socket read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "30000")]
    read_timeout_ms: u64,

    /// Socket write timeout in milliseconds (0 disables)
    #[arg(long, default_value = "30000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fileshare=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("fileshare server v{}", fileshare::VERSION);
    tracing::info!("Shared folder: {}", args.shared_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .shared_dir(&args.shared_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .pending_connections(args.pending)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
