//! `ndnmgmt` binary: connects the forwarder and backend sockets and serves
//! management commands until interrupted.

mod cli;

use std::time::Duration;

use clap::Parser;
use ndnmgmt::{BridgeConfig, BridgeError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();
    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "serving metrics");
    }
    #[cfg(not(feature = "metrics"))]
    if cli.metrics_addr.is_some() {
        tracing::warn!("built without the metrics feature; ignoring --metrics-addr");
    }

    let config = configure(&cli)?;
    ndnmgmt::connect_and_serve(&config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

fn configure(cli: &cli::Cli) -> Result<BridgeConfig, BridgeError> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(path) = &cli.forwarder_socket {
        config = config.forwarder_socket(path);
    }
    if let Some(path) = &cli.backend_socket {
        config = config.backend_socket(path);
    }
    if let Some(size) = cli.max_packet_size {
        config = config.max_packet_size(size);
    }
    if let Some(ms) = cli.backend_timeout_ms {
        config = config.backend_timeout(Some(Duration::from_millis(ms)));
    }
    Ok(config)
}
