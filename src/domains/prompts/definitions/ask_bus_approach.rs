//! Bus approach question prompt.

use super::{PromptDefinition, argument};
use rmcp::model::PromptArgument;

/// Asks for live arrival information at a station, optionally for one route.
pub struct AskBusApproachPrompt;

impl PromptDefinition for AskBusApproachPrompt {
    const NAME: &'static str = "ask_bus_approach";
    const DESCRIPTION: &'static str = "Ask for the bus approach information at a bus station";

    fn template() -> &'static str {
        "{{station_name}}の{{#if route_code}}{{route_code}}の{{/if}}バスの到着情報を教えて"
    }

    fn arguments() -> Vec<PromptArgument> {
        vec![
            argument("station_name", "バス停名 (例: 栄)", true),
            argument("route_code", "系統コード (例: 1123002)", false),
        ]
    }
}
