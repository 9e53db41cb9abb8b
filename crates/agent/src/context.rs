//! Prompt assembly and conversation state

use scout_provider::{Message, Role};

use crate::tools::{ToolDescriptor, ToolResult};

/// Builds the fixed turns the loop feeds back to the model
pub struct ContextBuilder;

impl ContextBuilder {
    /// System turn: tool catalogue plus the output-format contract
    pub fn system_prompt(tools: &[ToolDescriptor]) -> String {
        let catalogue = if tools.is_empty() {
            "(none)".to_string()
        } else {
            tools
                .iter()
                .map(|t| format!("- {}: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are an autonomous agent that completes goals by calling tools.

Available tools:
{}

RESPONSE FORMAT: reply with exactly one JSON object and nothing else.
To use a tool: {{"tool": "tool_name", "args": {{"key": "value"}}}}
When completely done: {{"done": true, "summary": "what you accomplished"}}

Call one tool per reply. After each call you will receive the tool's result."#,
            catalogue
        )
    }

    pub fn goal_turn(goal: &str) -> String {
        format!("Goal: {}", goal)
    }

    /// Reply was JSON but named neither a tool nor completion
    pub fn missing_action(tool_names: &[String]) -> String {
        format!(
            "Error: You must specify a tool to use. Available tools: {}. \
             Use format: {{\"tool\": \"tool_name\", \"args\": {{}}}} \
             or {{\"done\": true, \"summary\": \"...\"}}",
            format_names(tool_names)
        )
    }

    pub fn unknown_tool(name: &str, tool_names: &[String]) -> String {
        format!(
            "Error: Unknown tool: {}. Available tools: {}",
            name,
            format_names(tool_names)
        )
    }

    pub fn invalid_arguments(tool: &str, message: &str) -> String {
        format!(
            "Error: Invalid arguments for {}: {}. Retry with corrected args.",
            tool, message
        )
    }

    pub fn tool_result(result: &ToolResult) -> String {
        let body = serde_json::to_string(result)
            .unwrap_or_else(|_| r#"{"success": false, "error": "unserializable result"}"#.to_string());
        format!("Tool execution result: {}", body)
    }
}

fn format_names(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

/// Append-only conversation for one run
///
/// Turn 0 is always the system turn and turn 1 the goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, goal: &str) -> Self {
        Self {
            turns: vec![
                Message::system(system_prompt),
                Message::user(ContextBuilder::goal_turn(goal)),
            ],
        }
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Message::assistant(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Message::user(content));
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.turns.last()
    }

    /// Latest user turn that is not the goal
    pub fn last_feedback(&self) -> Option<&str> {
        self.turns
            .iter()
            .skip(2)
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
