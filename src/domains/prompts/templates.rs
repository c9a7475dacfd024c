//! Prompt template rendering.
//!
//! Supported syntax:
//! - `{{name}}` is replaced by the argument value, or removed when absent
//! - `{{#if name}}..{{/if}}` keeps its body only when `name` is non-empty
//! - `{{#if name}}..{{else}}..{{/if}}` picks one of two bodies
//!
//! Conditionals do not nest. Argument values are inserted verbatim and never
//! re-scanned for tags.

use rmcp::model::PromptArgument;
use std::collections::HashMap;

use super::error::PromptError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const IF_TAG: &str = "#if ";
const ELSE_TAG: &str = "{{else}}";
const END_IF_TAG: &str = "{{/if}}";

/// A prompt template that can be instantiated with arguments.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The unique name of the prompt.
    pub name: String,

    /// A description of what the prompt does.
    pub description: Option<String>,

    /// The arguments that this prompt accepts.
    pub arguments: Vec<PromptArgument>,

    /// The template string.
    pub template: String,
}

impl PromptTemplate {
    /// Render the template with the given arguments.
    pub fn render(&self, arguments: &HashMap<String, String>) -> Result<String, PromptError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or_else(|| PromptError::template("Unclosed {{ tag"))?;
            let tag = &after_open[..end];
            rest = &after_open[end + CLOSE.len()..];

            if let Some(var) = tag.strip_prefix(IF_TAG) {
                let end_if = rest
                    .find(END_IF_TAG)
                    .ok_or_else(|| PromptError::template("Missing {{/if}} tag"))?;
                let block = &rest[..end_if];
                rest = &rest[end_if + END_IF_TAG.len()..];

                let (then_part, else_part) = block.split_once(ELSE_TAG).unwrap_or((block, ""));
                let chosen = if is_set(arguments, var.trim()) {
                    then_part
                } else {
                    else_part
                };
                substitute(chosen, arguments, &mut out)?;
            } else if tag.starts_with('#') || tag.starts_with('/') || tag == "else" {
                return Err(PromptError::template(format!("Unexpected tag {{{{{tag}}}}}")));
            } else if let Some(value) = arguments.get(tag.trim()) {
                out.push_str(value);
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

fn is_set(arguments: &HashMap<String, String>, name: &str) -> bool {
    arguments.get(name).is_some_and(|v| !v.is_empty())
}

/// Replace plain `{{name}}` placeholders inside a conditional body.
fn substitute(
    text: &str,
    arguments: &HashMap<String, String>,
    out: &mut String,
) -> Result<(), PromptError> {
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or_else(|| PromptError::template("Unclosed {{ tag"))?;
        if let Some(value) = arguments.get(after_open[..end].trim()) {
            out.push_str(value);
        }
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(())
}
