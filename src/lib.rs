//! Nagoya Bus MCP Server Library
//!
//! A Model Context Protocol server answering questions about Nagoya city
//! buses: station lookup, timetables and live bus approach information,
//! backed by the public transit API of the Nagoya City Transportation Bureau.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **bus**: upstream API client, reference data, approach engine
//!   - **tools**: MCP tools that can be executed by clients
//!   - **prompts**: prompt templates for common questions
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nagoya_bus_mcp::{core::Config, core::McpServer, domains::bus::BusContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let context = BusContext::init(&config.bus_api).await?;
//!     let server = McpServer::new(config, Arc::new(context));
//!     // Start a transport with the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
