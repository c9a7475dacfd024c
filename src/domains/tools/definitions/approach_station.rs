//! Live approach tool for a whole station.

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
use crate::domains::bus::station_approach::RouteAtPole;
use crate::domains::bus::{BusContext, StationApproach, get_station_approach};
use crate::domains::tools::ToolError;

/// Parameters for the station approach tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApproachForStationParams {
    /// バス停番号 (例: 22460)
    pub station_number: u32,
}

/// A bus heading to the station on one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ApproachingBusForStationRoute {
    /// 接近中のバスの現在位置の説明
    pub location: String,
    /// 直前に通過したバス停名
    pub previous_station_name: String,
    /// 直前のバス停の通過時刻(HH:MM:SS形式)
    pub pass_time: String,
}

/// Live state of one route at one pole of the station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ApproachForStationRoute {
    /// 系統コード
    pub route_code: String,
    /// 系統
    pub route: String,
    /// 行き先
    pub direction: String,
    /// のりば
    pub pole: String,
    /// 前回のバスがのりばを通過した時刻 (HH:MM:SS形式)
    pub last_pass_time: Option<String>,
    /// 接近中のバスの情報
    pub approaching_buses: Vec<ApproachingBusForStationRoute>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApproachForStationResponse {
    /// 接近情報のある系統のリスト
    pub routes: Vec<ApproachForStationRoute>,
    /// バス停の接近情報のURL
    pub url: String,
}

impl From<RouteAtPole> for ApproachForStationRoute {
    fn from(route: RouteAtPole) -> Self {
        let approaching_buses = route
            .approaching
            .into_iter()
            .map(|bus| ApproachingBusForStationRoute {
                location: format!("{}停前を通過", bus.stops_before),
                previous_station_name: bus.position.previous_stop.station_name,
                pass_time: bus.position.passed_time,
            })
            .collect();

        Self {
            route_code: route.route_code,
            route: route.route,
            direction: route.direction,
            pole: route.pole,
            last_pass_time: route.last_pass_time,
            approaching_buses,
        }
    }
}

impl ApproachForStationResponse {
    /// Build the response, linking the station's public approach page.
    fn new(base_url: &str, approach: StationApproach) -> Self {
        Self {
            url: format!(
                "{base_url}/jp/pc/BUS/stand_access.html?name={}",
                approach.station_name
            ),
            routes: approach.routes.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct ApproachForStationTool;

impl ApproachForStationTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_approach_for_station";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get live bus information for every route at a Nagoya city bus station. Routes with neither a recent pass nor an approaching bus are left out; the rest are ordered by how close their nearest bus is.";

    pub async fn approach(
        params: &ApproachForStationParams,
        context: &BusContext,
    ) -> Result<ApproachForStationResponse, ToolError> {
        let approach = get_station_approach(
            context.api.as_ref(),
            &context.base_data,
            params.station_number,
        )
        .await?;
        Ok(ApproachForStationResponse::new(context.base_url(), approach))
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(station_number = params.station_number))]
    pub async fn execute(params: &ApproachForStationParams, context: &BusContext) -> CallToolResult {
        info!(
            "Getting real-time approach information for station number {}",
            params.station_number
        );
        into_call_result(Self::approach(params, context).await, |r| {
            format!(
                "{} active route(s) at station {}",
                r.routes.len(),
                params.station_number
            )
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        context: Arc<BusContext>,
    ) -> Result<serde_json::Value, String> {
        let station_number = super::common::station_number_arg(&arguments, "station_number")?;
        let params = ApproachForStationParams { station_number };
        super::common::to_http_response(&Self::execute(&params, &context).await)
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<ApproachForStationParams>().into(),
            annotations: None,
            output_schema: Some(schema_for_type::<ApproachForStationResponse>().into()),
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
                let params: ApproachForStationParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &context).await)
            }
            .boxed()
        })
    }
}
