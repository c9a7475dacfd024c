//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream transit API configuration.
    pub bus_api: BusApiConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for the Nagoya city transit API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusApiConfig {
    /// Base URL of the transit API, without trailing slash.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum number of route masters kept in memory.
    pub route_cache_capacity: u64,
}

/// Public endpoint of the Nagoya City Transportation Bureau.
pub const DEFAULT_BUS_API_BASE_URL: &str = "https://www.kotsu.city.nagoya.jp";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "Nagoya Bus MCP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Load the log level, reading `.env` first.
    ///
    /// Called before the subscriber is installed, so it must not log.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        std::env::var("MCP_LOG_LEVEL")
            .map(|level| Self { level })
            .unwrap_or_default()
    }
}

impl Default for BusApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BUS_API_BASE_URL.to_string(),
            timeout_secs: 30,
            route_cache_capacity: 1024,
        }
    }
}

impl BusApiConfig {
    /// Load transit API configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("MCP_BUS_API_BASE_URL") {
            info!("Transit API base URL set to {}", base_url);
            config.base_url = base_url;
        }

        // 0 is rejected: reqwest would time out every request.
        let default_timeout = NonZeroU64::new(config.timeout_secs).unwrap_or(NonZeroU64::MIN);
        config.timeout_secs = parse_env("MCP_BUS_API_TIMEOUT_SECS", default_timeout).get();
        config.route_cache_capacity =
            parse_env("MCP_ROUTE_CACHE_CAPACITY", config.route_cache_capacity);

        config
    }
}

/// Read `key` as a `T`, keeping `default` when unset or unparsable.
pub(crate) fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        config.transport = TransportConfig::from_env();
        config.bus_api = BusApiConfig::from_env();

        config
    }
}
