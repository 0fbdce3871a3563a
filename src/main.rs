//! Product catalog service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                  PRODUCT CATALOG                      │
//!                 │                                                       │
//!   Client        │  ┌─────────┐   ┌──────────┐   ┌─────────────────┐    │
//!   ──────────────┼─▶│  http   │──▶│ catalog  │──▶│ RemoteProducts  │────┼──▶ Products API
//!                 │  │ server  │   │  facade  │   │  or InMemory    │    │
//!                 │  └─────────┘   └──────────┘   └───────┬─────────┘    │
//!                 │                                       │              │
//!                 │                       ┌───────────────┼───────┐      │
//!                 │                       ▼               ▼       │      │
//!                 │                ┌────────────┐  ┌────────────┐ │      │
//!                 │                │    auth    │  │ resilience │ │      │
//!                 │                │  (tokens)  │  │ retry + cb │ │      │
//!                 │                └─────┬──────┘  └────────────┘ │      │
//!                 │                      │                        │      │
//!                 └──────────────────────┼────────────────────────┘──────┘
//!                                        ▼
//!                                 Token endpoint
//! ```
//!
//! Without `--config` the service starts against the in-memory demo catalog.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use product_catalog::catalog::build_facade;
use product_catalog::config::{load_config, BackendKind, CatalogConfig};
use product_catalog::http::{AppState, HttpServer};
use product_catalog::lifecycle::{signals, Shutdown};
use product_catalog::observability::{logging, metrics};
use product_catalog::resilience::BreakerRegistry;

#[derive(Parser)]
#[command(name = "product-catalog")]
#[command(about = "Product catalog backed by a remote Products API", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = CatalogConfig::default();
            config.products_api.backend = BackendKind::InMemory;
            config
        }
    };

    logging::init_tracing(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.products_api.backend,
        total_timeout_secs = config.products_api.total_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let breakers = Arc::new(BreakerRegistry::new(config.circuit_breaker.clone()));
    let products = build_facade(&config, &breakers)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, AppState { products, breakers });
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
