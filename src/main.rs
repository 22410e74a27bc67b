//! Device registry service.
//!
//! # Architecture Overview
//!
//! ```text
//!     HTTP client ──▶ http facade ──▶ RegistryClient (ask + timeout)
//!                                            │
//!                                            ▼
//!                                   ┌─────────────────┐
//!                                   │    Registry     │  group id → group
//!                                   └────────┬────────┘
//!                              ┌─────────────┴─────────────┐
//!                              ▼                           ▼
//!                      ┌──────────────┐            ┌──────────────┐
//!                      │    Group     │            │    Group     │  leaf id → leaf
//!                      └──────┬───────┘            └──────────────┘
//!                  ┌──────────┼───────────┐
//!                  ▼          ▼           ▼
//!               Leaf        Leaf   AggregationSession (per request)
//! ```

use std::path::PathBuf;

use clap::Parser;

use device_registry::config::{load_config, RegistryConfig};
use device_registry::lifecycle::startup;
use device_registry::observability::logging;

#[derive(Parser)]
#[command(name = "device-registry")]
#[command(about = "Hierarchical device registry with group-wide reading aggregation", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "device-registry starting");
    tracing::info!(
        aggregate_timeout_ms = config.registry.aggregate_timeout_ms,
        http_enabled = config.http.enabled,
        bind_address = %config.http.bind_address,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
