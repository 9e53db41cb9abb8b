//! Decoding model replies into actions

use serde_json::{Map, Value};

/// Summary used when the model finishes without one
pub const DEFAULT_SUMMARY: &str = "Task completed";

/// What the model asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ToolInvocation { tool: String, arguments: Value },
    Completion { summary: String },
}

/// A reply that parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Action(Action),
    /// Valid JSON object, but neither a tool call nor a completion
    Incomplete,
}

/// Interpret one model reply.
///
/// `Err` means the reply is not a JSON object at all. A truthy `done`
/// takes precedence over `tool` when both are present.
pub fn decode_reply(raw: &str) -> Result<Decoded, String> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;
    let Value::Object(obj) = value else {
        return Err(format!("expected a JSON object, got {}", kind_of(&value)));
    };

    if obj.get("done").map(is_truthy).unwrap_or(false) {
        let summary = obj
            .get("summary")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SUMMARY)
            .to_string();
        return Ok(Decoded::Action(Action::Completion { summary }));
    }

    match obj.get("tool").and_then(Value::as_str) {
        Some(tool) if !tool.trim().is_empty() => Ok(Decoded::Action(Action::ToolInvocation {
            tool: tool.trim().to_string(),
            arguments: obj.get("args").cloned().unwrap_or(Value::Object(Map::new())),
        })),
        _ => Ok(Decoded::Incomplete),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
