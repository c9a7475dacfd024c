//! Station timetable tool.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::common::into_call_result;
use crate::domains::bus::BusContext;
use crate::domains::bus::models::{DiagramResponse, DiagramRoute, OrderedMap};
use crate::domains::tools::ToolError;

/// Parameters for the timetable tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimetableParams {
    /// バス停番号 (例: 22460)
    pub station_number: u32,
}

/// Timetable of one route at one pole.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TimeTable {
    /// 系統
    pub route: String,
    /// 系統コードのリスト
    pub route_codes: Vec<u64>,
    /// 行き先
    pub direction: String,
    /// のりば
    pub pole: String,
    /// 停車バス停名のリスト
    pub stop_station_names: Vec<String>,
    /// 曜日別の時刻表 ("H:MM")
    pub timetable: OrderedMap<String, Vec<String>>,
    /// 系統の時刻表のURL
    pub url: String,
}

/// All timetables of a station.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TimeTableResponse {
    /// バス停番号
    pub station_number: u32,
    pub timetables: Vec<TimeTable>,
    /// 系統別の時刻表一覧のURL
    pub url: String,
}

pub struct TimetableTool;

impl TimetableTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_timetable";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get the timetables of every route at a Nagoya city bus station: route, direction, boarding pole, stops and departure times by day type.";

    /// Fetch and format the station's timetables.
    pub async fn timetable(
        params: &TimetableParams,
        context: &BusContext,
    ) -> Result<TimeTableResponse, ToolError> {
        let station_number = params.station_number;
        let Some(station_name) = context.base_data.get_station_name(station_number) else {
            warn!("Station number {} not found", station_number);
            return Err(ToolError::station_number_not_found(station_number));
        };

        let diagram = context.api.station_diagram(station_number).await?;
        Ok(format_timetables(
            context.base_url(),
            station_number,
            station_name,
            diagram,
        ))
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(station_number = params.station_number))]
    pub async fn execute(params: &TimetableParams, context: &BusContext) -> CallToolResult {
        info!("Getting timetable for station number {}", params.station_number);
        into_call_result(Self::timetable(params, context).await, |r| {
            format!(
                "{} timetable(s) for station {}",
                r.timetables.len(),
                r.station_number
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
        let params = TimetableParams { station_number };
        super::common::to_http_response(&Self::execute(&params, &context).await)
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: schema_for_type::<TimetableParams>().into(),
            annotations: None,
            output_schema: Some(schema_for_type::<TimeTableResponse>().into()),
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
                let params: TimetableParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &context).await)
            }
            .boxed()
        })
    }
}

fn format_timetables(
    base_url: &str,
    station_number: u32,
    station_name: &str,
    diagram: DiagramResponse,
) -> TimeTableResponse {
    let mut timetables = Vec::new();
    for (route, railways) in diagram {
        for (index, railway) in railways.into_iter().enumerate() {
            timetables.push(format_route(base_url, station_name, &route, index, railway));
        }
    }

    TimeTableResponse {
        station_number,
        timetables,
        url: format!("{base_url}/jp/pc/bus/timetable_list.html?name={station_name}&toname="),
    }
}

fn format_route(
    base_url: &str,
    station_name: &str,
    route: &str,
    index: usize,
    railway: DiagramRoute,
) -> TimeTable {
    let timetable = railway
        .diagram
        .into_iter()
        .map(|(day, hours)| {
            let times = hours
                .iter()
                .flat_map(|(hour, minutes)| minutes.iter().map(move |m| format!("{hour}:{m:02}")))
                .collect();
            (day, times)
        })
        .collect();

    TimeTable {
        route: route.to_string(),
        route_codes: railway.railway_ids,
        direction: railway.railway.join("・"),
        pole: railway.polename,
        stop_station_names: railway.stations.into_iter().flatten().collect(),
        timetable,
        url: format!(
            "{base_url}/jp/pc/bus/timetable_dtl.html?name={station_name}&keito={route}&lineindex={index}"
        ),
    }
}
