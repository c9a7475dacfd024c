//! Live approach tool for a single route.

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
use crate::domains::bus::{ApproachInfo, ApproachPosition, BusContext, get_realtime_approach};
use crate::domains::tools::ToolError;

/// Parameters for the route approach tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApproachForRouteParams {
    /// 系統コード (例: 1123002)
    pub route_code: String,
}

/// A stop of the route with the last time a bus left it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ApproachForRouteBusStop {
    /// のりばコード
    pub bus_stop_code: String,
    /// バス停番号
    pub station_number: u32,
    /// バス停名
    pub station_name: String,
    /// のりば
    pub pole: String,
    /// 最終通過時刻
    pub last_pass_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApproachForRouteResponse {
    /// 通過時間を含む、系統のバス停のリスト
    pub bus_stops: Vec<ApproachForRouteBusStop>,
    /// 現在走行中のバスの位置のリスト
    pub bus_positions: Vec<ApproachPosition>,
}

impl From<ApproachInfo> for ApproachForRouteResponse {
    fn from(info: ApproachInfo) -> Self {
        let bus_stops = info
            .bus_stops
            .iter()
            .map(|stop| ApproachForRouteBusStop {
                bus_stop_code: stop.bus_stop_code.clone(),
                station_number: stop.station_number,
                station_name: stop.station_name.clone(),
                pole: stop.pole.clone(),
                last_pass_time: info
                    .last_pass_time_for_code(&stop.bus_stop_code)
                    .map(str::to_string),
            })
            .collect();

        Self {
            bus_stops,
            bus_positions: info.current_positions,
        }
    }
}

pub struct ApproachForRouteTool;

impl ApproachForRouteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_approach_for_route";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get live bus information for a Nagoya city bus route: every stop with the time the last bus passed it, and the current position of each bus on the road.";

    pub async fn approach(
        params: &ApproachForRouteParams,
        context: &BusContext,
    ) -> Result<ApproachForRouteResponse, ToolError> {
        let info =
            get_realtime_approach(context.api.as_ref(), &context.base_data, &params.route_code)
                .await?;
        Ok(info.into())
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(route_code = %params.route_code))]
    pub async fn execute(params: &ApproachForRouteParams, context: &BusContext) -> CallToolResult {
        info!(
            "Getting real-time approach information for route code {}",
            params.route_code
        );
        into_call_result(Self::approach(params, context).await, |r| {
            format!(
                "Route {}: {} stops, {} bus(es) running",
                params.route_code,
                r.bus_stops.len(),
                r.bus_positions.len()
            )
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        context: Arc<BusContext>,
    ) -> Result<serde_json::Value, String> {
        let route_code = super::common::string_arg(&arguments, "route_code")?;
        let params = ApproachForRouteParams { route_code };
        super::common::to_http_response(&Self::execute(&params, &context).await)
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<ApproachForRouteParams>().into(),
            annotations: None,
            output_schema: Some(schema_for_type::<ApproachForRouteResponse>().into()),
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
                let params: ApproachForRouteParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &context).await)
            }
            .boxed()
        })
    }
}
