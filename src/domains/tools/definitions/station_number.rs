//! Station number lookup tool.
//!
//! Resolves a station name to its number, exactly or by fuzzy match.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::common::into_call_result;
use crate::domains::bus::{BusContext, DEFAULT_FUZZY_CUTOFF};
use crate::domains::tools::ToolError;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the station number tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StationNumberParams {
    /// バス停名 (例: 名古屋駅)
    pub station_name: String,
}

// ============================================================================
// Output Structure
// ============================================================================

/// Matched station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct StationNumberResponse {
    /// バス停名
    pub station_name: String,
    /// バス停番号
    pub station_number: u32,
}

// ============================================================================
// Tool Definition
// ============================================================================

pub struct StationNumberTool;

impl StationNumberTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_station_number";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get the station number for a Nagoya city bus station name. Tries an exact match first, then falls back to fuzzy matching with a 60% similarity threshold.";

    /// Resolve the station.
    pub fn lookup(
        params: &StationNumberParams,
        context: &BusContext,
    ) -> Result<StationNumberResponse, ToolError> {
        let base_data = &context.base_data;
        let name = params.station_name.as_str();

        if let Some(station_number) = base_data.get_station_number(name) {
            return Ok(StationNumberResponse {
                station_name: name.to_string(),
                station_number,
            });
        }

        info!("No exact match found for {}, trying fuzzy matching", name);
        let Some(station_number) = base_data.find_station_number(name, DEFAULT_FUZZY_CUTOFF)
        else {
            info!("No fuzzy match found for {}", name);
            return Err(ToolError::station_not_found(name));
        };

        let station_name = base_data
            .get_station_name(station_number)
            .ok_or_else(|| ToolError::internal("Inconsistent base data: station number has no name"))?;
        info!(
            "Found closest match: {} (station number: {})",
            station_name, station_number
        );

        Ok(StationNumberResponse {
            station_name: station_name.to_string(),
            station_number,
        })
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(station_name = %params.station_name))]
    pub fn execute(params: &StationNumberParams, context: &BusContext) -> CallToolResult {
        info!("Getting station number for {}", params.station_name);
        into_call_result(Self::lookup(params, context), |r| {
            format!("{}: station number {}", r.station_name, r.station_number)
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        context: Arc<BusContext>,
    ) -> Result<serde_json::Value, String> {
        let station_name = super::common::string_arg(&arguments, "station_name")?;
        let params = StationNumberParams { station_name };
        super::common::to_http_response(&Self::execute(&params, &context))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<StationNumberParams>().into(),
            annotations: None,
            output_schema: Some(schema_for_type::<StationNumberResponse>().into()),
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(context: Arc<BusContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let context = context.clone();
            async move {
                let params: StationNumberParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &context))
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::bus::testing::FakeTransitApi;
    use crate::domains::tools::definitions::common::result_text;

    async fn context() -> BusContext {
        BusContext::with_api(Arc::new(FakeTransitApi::sakae_route()))
            .await
            .unwrap()
    }

    fn params(name: &str) -> StationNumberParams {
        StationNumberParams {
            station_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_exact_match() {
        let context = context().await;
        let response = StationNumberTool::lookup(&params("名古屋駅"), &context).unwrap();
        assert_eq!(
            response,
            StationNumberResponse {
                station_name: "名古屋駅".to_string(),
                station_number: 41200,
            }
        );
    }

    #[tokio::test]
    async fn test_fuzzy_match_returns_canonical_name() {
        let context = context().await;
        let response = StationNumberTool::lookup(&params("名古駅"), &context).unwrap();
        assert_eq!(response.station_name, "名古屋駅");
        assert_eq!(response.station_number, 41200);
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let context = context().await;
        let result = StationNumberTool::execute(&params("存在しないバス停"), &context);
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result), "Station not found: 存在しないバス停");
    }

    #[tokio::test]
    async fn test_structured_content_in_result() {
        let context = context().await;
        let result = StationNumberTool::execute(&params("栄"), &context);
        let structured = result
            .structured_content
            .as_ref()
            .expect("structured_content should exist");
        assert_eq!(structured["station_name"], "栄");
        assert_eq!(structured["station_number"], 21010);
        assert!(result_text(&result).contains("21010"));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_http_handler_missing_param() {
        let context = Arc::new(context().await);
        let result = StationNumberTool::http_handler(serde_json::json!({}), context).await;
        assert!(result.is_err());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_http_handler_serializes_structured_content() {
        let context = Arc::new(context().await);
        let value = StationNumberTool::http_handler(
            serde_json::json!({"station_name": "栄"}),
            context,
        )
        .await
        .unwrap();
        assert_eq!(value["structuredContent"]["station_number"], 21010);
    }
}
