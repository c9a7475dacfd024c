//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use crate::domains::bus::BusContext;

use super::definitions::{
    ApproachForRouteTool, ApproachForStationTool, StationNumberTool, TimetableTool,
};

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    context: Arc<BusContext>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(context: Arc<BusContext>) -> Self {
        Self { context }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            StationNumberTool::NAME,
            TimetableTool::NAME,
            ApproachForRouteTool::NAME,
            ApproachForStationTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both HTTP and STDIO/TCP transports list tools from the same
    /// definitions.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            StationNumberTool::to_tool(),
            TimetableTool::to_tool(),
            ApproachForRouteTool::to_tool(),
            ApproachForStationTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        let context = self.context.clone();
        match name {
            StationNumberTool::NAME => StationNumberTool::http_handler(arguments, context).await,
            TimetableTool::NAME => TimetableTool::http_handler(arguments, context).await,
            ApproachForRouteTool::NAME => {
                ApproachForRouteTool::http_handler(arguments, context).await
            }
            ApproachForStationTool::NAME => {
                ApproachForStationTool::http_handler(arguments, context).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(format!("Unknown tool: {}", name))
            }
        }
    }
}
