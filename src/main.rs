//! Nagoya Bus MCP Server Entry Point
//!
//! Initializes logging, loads configuration and reference data, then serves
//! MCP over the configured transport.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use nagoya_bus_mcp::core::config::LoggingConfig;
use nagoya_bus_mcp::core::{Config, McpServer, TransportService};
use nagoya_bus_mcp::domains::bus::BusContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging must be installed before the config is read.
    init_logging(&LoggingConfig::from_env().level);
    let config = Config::from_env();

    info!("Starting {} v{}", config.server.name, config.server.version);

    info!("Lifespan start: loading bus reference data");
    let context = BusContext::init(&config.bus_api)
        .await
        .context("Failed to load bus reference data")?;
    info!(
        "Loaded {} stations from {}",
        context.base_data.station_count(),
        context.base_url()
    );

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, Arc::new(context));

    transport.run(server).await?;

    info!("Lifespan close: server shut down");
    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout is reserved for the stdio transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
