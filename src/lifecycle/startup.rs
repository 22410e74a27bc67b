//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the registry, then the HTTP facade
//! - Run until the shutdown signal fires
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::RegistryConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::registry::{Registry, RegistryClient};

/// Run the service described by `config` until a termination signal.
pub async fn run(config: RegistryConfig) -> Result<(), std::io::Error> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let registry = Registry::spawn(shutdown.subscribe());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { signals::shutdown_on_signal(&shutdown).await });
    }

    if config.http.enabled {
        let client = RegistryClient::new(registry, config.http.ask_timeout())
            .with_aggregate_timeout(config.registry.aggregate_timeout());
        let listener = TcpListener::bind(&config.http.bind_address).await?;
        HttpServer::new(client, &config.http)
            .run(listener, shutdown.subscribe())
            .await?;
    } else {
        tracing::info!("HTTP facade disabled, registry running until shutdown");
        let mut stop = shutdown.subscribe();
        let _ = stop.recv().await;
    }

    Ok(())
}
