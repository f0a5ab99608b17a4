//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the routing table from the environment
//! - Load TLS material
//! - Start the metrics endpoint when enabled
//! - Bind the listener and serve until a termination signal
//!
//! Any failure here is fatal. Each class maps to its own exit code.

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, ConfigError, GatewayConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::tls::{load_tls_config, TlsError};
use crate::observability::metrics;
use crate::routing::RoutingTable;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => 1,
            StartupError::Tls(_) => 2,
            StartupError::Bind { .. } | StartupError::Serve(_) => 3,
        }
    }
}

/// Run the gateway until SIGINT or SIGTERM.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    let services = config.services.clone().unwrap_or_default();
    let table = RoutingTable::from_env(&services);

    tracing::info!(
        services = table.len(),
        port = config.listener.port,
        upstream_host = %config.upstream.host,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    let tls = load_tls_config(
        Path::new(&config.listener.tls.cert_path),
        Path::new(&config.listener.tls.key_path),
    )
    .await?;

    start_metrics(&config);

    let addr = resolve_bind_address(&config).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, table);
    server
        .run_tls(addr, tls, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn start_metrics(config: &GatewayConfig) {
    if !config.observability.metrics_enabled {
        return;
    }
    match config.observability.metrics_address.parse() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(_) => tracing::error!(
            metrics_address = %config.observability.metrics_address,
            "Failed to parse metrics address"
        ),
    }
}

async fn resolve_bind_address(config: &GatewayConfig) -> Result<SocketAddr, StartupError> {
    let address = config.listener.bind_address();
    let mut addrs = tokio::net::lookup_host(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| StartupError::Bind {
        address: address.clone(),
        source: std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no address resolved"),
    })
}
