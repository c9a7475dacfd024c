//! Helpers shared by the bus tools.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::warn;

use crate::domains::tools::ToolError;

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Text summary for humans plus the response as structured content.
pub fn structured_result<T: Serialize>(summary: String, data: &T) -> CallToolResult {
    match serde_json::to_value(data) {
        Ok(value) => CallToolResult {
            content: vec![Content::text(summary)],
            structured_content: Some(value),
            is_error: Some(false),
            meta: None,
        },
        Err(e) => error_result(&format!("Failed to serialize tool output: {}", e)),
    }
}

/// Map a tool outcome onto the MCP result.
pub fn into_call_result<T: Serialize>(
    outcome: Result<T, ToolError>,
    summary: impl FnOnce(&T) -> String,
) -> CallToolResult {
    match outcome {
        Ok(response) => structured_result(summary(&response), &response),
        Err(e) => error_result(&e.to_string()),
    }
}

/// Read a required string argument from a raw JSON-RPC call.
#[cfg(feature = "http")]
pub fn string_arg(arguments: &serde_json::Value, name: &str) -> Result<String, String> {
    arguments
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Missing or invalid '{}' parameter", name))
}

/// Read a required station number argument from a raw JSON-RPC call.
#[cfg(feature = "http")]
pub fn station_number_arg(arguments: &serde_json::Value, name: &str) -> Result<u32, String> {
    arguments
        .get(name)
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("Missing or invalid '{}' parameter", name))
}

/// Serialize the full CallToolResult so HTTP clients see structuredContent.
#[cfg(feature = "http")]
pub fn to_http_response(result: &CallToolResult) -> Result<serde_json::Value, String> {
    serde_json::to_value(result).map_err(|e| e.to_string())
}

#[cfg(test)]
pub(crate) fn result_text(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        rmcp::model::RawContent::Text(text) => &text.text,
        _ => panic!("Expected text content"),
    }
}
