//! Prompt definitions module.
//!
//! Each prompt is defined in its own file with its metadata and template.
//! New prompts implement [`PromptDefinition`], are exported here and
//! registered in `registry.rs`.

use rmcp::model::PromptArgument;

mod ask_bus_approach;
mod ask_timetable;

pub use ask_bus_approach::AskBusApproachPrompt;
pub use ask_timetable::AskTimetablePrompt;

/// Trait for prompt definitions.
pub trait PromptDefinition {
    /// The unique name of the prompt.
    const NAME: &'static str;

    /// A description of what the prompt does.
    const DESCRIPTION: &'static str;

    /// The template string with {{variable}} placeholders.
    fn template() -> &'static str;

    /// The arguments this prompt accepts.
    fn arguments() -> Vec<PromptArgument>;
}

/// Build a prompt argument.
pub(crate) fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        title: None,
        description: Some(description.to_string()),
        required: Some(required),
    }
}
