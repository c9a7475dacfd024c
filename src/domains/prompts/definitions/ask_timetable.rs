//! Timetable question prompt.

use super::{PromptDefinition, argument};
use rmcp::model::PromptArgument;

/// Asks for the timetable of a station, optionally on a given date.
pub struct AskTimetablePrompt;

impl PromptDefinition for AskTimetablePrompt {
    const NAME: &'static str = "ask_timetable";
    const DESCRIPTION: &'static str = "Ask for the timetable of a bus station on a specific date";

    fn template() -> &'static str {
        "{{station_name}}の{{#if date}}{{date}}の{{/if}}バスの時刻表を教えて"
    }

    fn arguments() -> Vec<PromptArgument> {
        vec![
            argument("station_name", "バス停名 (例: 名古屋駅)", true),
            argument("date", "日付 (例: 今日, 12月24日)", false),
        ]
    }
}
