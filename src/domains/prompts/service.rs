//! Prompt service implementation.
//!
//! Lists the registered prompts and renders them into user messages.

use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};
use std::collections::HashMap;
use tracing::{debug, info};

use super::error::PromptError;
use super::registry::get_all_prompts;
use super::templates::PromptTemplate;

/// Service for listing and instantiating prompts.
pub struct PromptService {
    /// Registered prompts in listing order.
    prompts: Vec<PromptTemplate>,
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptService {
    /// Create a PromptService holding every registered prompt.
    pub fn new() -> Self {
        let prompts = get_all_prompts();
        info!("Registered {} prompts", prompts.len());
        Self { prompts }
    }

    /// List all available prompts.
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts
            .iter()
            .map(|template| Prompt {
                name: template.name.clone(),
                title: None,
                description: template.description.clone(),
                arguments: Some(template.arguments.clone()),
                icons: None,
                meta: None,
            })
            .collect()
    }

    /// Get a prompt with arguments substituted.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResult, PromptError> {
        let template = self
            .prompts
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| PromptError::not_found(name))?;

        let arguments = arguments.unwrap_or_default();
        for arg in &template.arguments {
            let missing = arguments.get(&arg.name).is_none_or(|v| v.is_empty());
            if arg.required.unwrap_or(false) && missing {
                return Err(PromptError::missing_argument(&arg.name));
            }
        }

        let content = template.render(&arguments)?;
        debug!("Rendered prompt {}: {}", name, content);

        Ok(GetPromptResult {
            description: template.description.clone(),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, content)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::PromptMessageContent;

    fn render(name: &str, pairs: &[(&str, &str)]) -> Result<String, PromptError> {
        let args = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let result = PromptService::new().get_prompt(name, Some(args))?;
        match &result.messages[0].content {
            PromptMessageContent::Text { text } => Ok(text.clone()),
            other => panic!("Expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_list_prompts_in_order() {
        let names: Vec<_> = PromptService::new()
            .list_prompts()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["ask_timetable", "ask_bus_approach"]);
    }

    #[test]
    fn test_ask_timetable() {
        assert_eq!(
            render("ask_timetable", &[("station_name", "名古屋駅"), ("date", "明日")]).unwrap(),
            "名古屋駅の明日のバスの時刻表を教えて"
        );
        assert_eq!(
            render("ask_timetable", &[("station_name", "名古屋駅")]).unwrap(),
            "名古屋駅のバスの時刻表を教えて"
        );
    }

    #[test]
    fn test_ask_bus_approach() {
        assert_eq!(
            render(
                "ask_bus_approach",
                &[("station_name", "栄"), ("route_code", "1123002")]
            )
            .unwrap(),
            "栄の1123002のバスの到着情報を教えて"
        );
        assert_eq!(
            render("ask_bus_approach", &[("station_name", "栄")]).unwrap(),
            "栄のバスの到着情報を教えて"
        );
    }

    #[test]
    fn test_missing_required_argument() {
        assert!(matches!(
            render("ask_timetable", &[("date", "明日")]),
            Err(PromptError::MissingArgument(ref a)) if a == "station_name"
        ));
    }

    #[test]
    fn test_get_nonexistent_prompt() {
        assert!(matches!(
            PromptService::new().get_prompt("nonexistent", None),
            Err(PromptError::NotFound(_))
        ));
    }
}
