//! GraphQL gateway.
//!
//! A small HTTP front door built with Tokio, hyper and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                  GATEWAY                      │
//!   Client Request    │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│   net   │──▶│  http   │──▶│  routing   │  │
//!                     │  │listener │   │ server  │   │ (frozen)   │  │
//!                     │  └─────────┘   └─────────┘   └─────┬──────┘  │
//!                     │                                    │ CORS     │
//!                     │          ┌───────────────┬─────────┴───┐      │
//!                     │          ▼               ▼             ▼      │
//!                     │   /api/graphql   /api/auth/signin   /static   │
//!                     │    (proxy) ──────────────────────────────────┼──▶ GraphQL
//!                     │                                              │    upstream
//!                     │  lifecycle: signals → shutdown → drain        │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use graphql_gateway::config::{load_config, GatewayConfig, ObservabilityConfig};
use graphql_gateway::lifecycle::startup::build_gateway;
use graphql_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "graphql-gateway", version)]
#[command(about = "HTTP gateway in front of a GraphQL endpoint", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                logging::init_logging(&ObservabilityConfig::default());
                tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
                return Err(e.into());
            }
        },
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("graphql-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.graphql_url,
        read_timeout_secs = config.timeouts.read_secs,
        write_timeout_secs = config.timeouts.write_secs,
        idle_timeout_secs = config.timeouts.idle_secs,
        read_header_timeout_secs = config.timeouts.read_header_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = build_gateway(config)?;
    if let Err(e) = server.start().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
