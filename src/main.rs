//! Delta Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 DELTA GATEWAY                 │
//!                      │                                               │
//!   Web frontend       │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ chat.rs  │──▶│resilience │──┼──▶ Chat backend
//!                      │  │ server  │   │  proxy   │   │  retry    │  │    (cold-starting)
//!                      │  └─────────┘   ├──────────┤   └───────────┘  │
//!                      │                │ auth.rs  │──▶┌───────────┐  │
//!                      │                │  gate    │   │ provider  │──┼──▶ Identity/subscription
//!                      │                └──────────┘   │  client   │  │    provider
//!                      │                      │        └───────────┘  │
//!                      │                      ▼                       │
//!                      │                ┌──────────┐                  │
//!                      │                │  access  │                  │
//!                      │                │ resolver │                  │
//!                      │                └──────────┘                  │
//!                      │                                               │
//!                      │  config ─ observability ─ lifecycle           │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use delta_gateway::config;
use delta_gateway::observability::{logging, metrics};
use delta_gateway::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "delta-gateway", version, about = "API gateway for the Delta website")]
struct Args {
    /// Path to a TOML configuration file. Without it, defaults plus
    /// DELTA_* environment overrides are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::config_from_env()?,
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("delta-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        provider = %config.provider.base_url,
        max_retries = config.retries.max_retries,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
