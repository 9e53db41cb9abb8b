//! Tool contract and registry
//!
//! Tools are written against [`Tool`] with a typed argument struct. The
//! registry holds them as [`ToolTrait`] objects, which decode the raw
//! argument mapping into that struct before calling in.

pub mod ats;
pub mod database;
pub mod filesystem;
pub mod github;
pub mod notify;
pub mod resume;
pub mod web;

pub use ats::{AtsMonitorTool, DetectAtsChangesTool, GreenhouseBoard, GreenhouseClient};
pub use database::{QueryListingsTool, SaveListingsTool};
pub use filesystem::FileWriteTool;
pub use github::{DetectChangesTool, GithubMonitorTool, GithubSource};
pub use notify::SendNotificationTool;
pub use resume::{MatchResumeTool, SkillProfile};
pub use web::{WebFetchTool, WebSearchTool};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{AgentError, Result};

pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// Uniform outcome of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> std::result::Result<Value, String> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(self.error.unwrap_or_else(|| "tool failed".to_string()))
        }
    }
}

/// Name and description shown to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// Argument type for tools that take nothing; extra keys are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoArgs {}

/// A capability with a typed argument contract
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send + 'static;

    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Errors returned here become `ToolResult { success: false }`
    async fn call(&self, args: Self::Args) -> std::result::Result<Value, ToolError>;
}

/// The arguments did not fit the tool's contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ArgumentError(pub String);

/// Object-safe view of a [`Tool`]
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(
        &self,
        args: Map<String, Value>,
    ) -> std::result::Result<ToolResult, ArgumentError>;
}

#[async_trait]
impl<T: Tool> ToolTrait for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    async fn execute(
        &self,
        args: Map<String, Value>,
    ) -> std::result::Result<ToolResult, ArgumentError> {
        let typed: T::Args = serde_json::from_value(Value::Object(args))
            .map_err(|e| ArgumentError(e.to_string()))?;

        Ok(match self.call(typed).await {
            Ok(data) => ToolResult::ok(data),
            Err(e) => ToolResult::err(e.to_string()),
        })
    }
}

pub type SharedTool = Arc<dyn ToolTrait>;

/// Why a dispatch never reached a tool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Name to tool mapping, fixed once built
pub struct ToolRegistry {
    tools: Vec<SharedTool>,
    index: HashMap<String, usize>,
    timeout: Option<Duration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            timeout: None,
        }
    }

    /// Build from a list; names must be unique
    pub fn from_tools(tools: Vec<SharedTool>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_shared(tool)?;
        }
        Ok(registry)
    }

    /// Bound every dispatch; expiry is reported as a failed tool result
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn register<T: Tool>(&mut self, tool: T) -> Result<()> {
        self.register_shared(Arc::new(tool))
    }

    pub fn register_shared(&mut self, tool: SharedTool) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<SharedTool> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run `name` with `args`; `null` args count as an empty mapping
    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<ToolResult, DispatchError> {
        let tool = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(DispatchError::InvalidArguments {
                    tool: name.to_string(),
                    message: format!("expected an object, got {}", other),
                })
            }
        };

        debug!("Dispatching tool: {}", name);
        // own task so a panicking tool surfaces as a JoinError, not an unwind
        let mut task = tokio::spawn(async move { tool.execute(args).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    warn!("◆ Tool {} timed out after {:?}", name, limit);
                    return Ok(ToolResult::err(format!(
                        "Tool {} timed out after {}s",
                        name,
                        limit.as_secs()
                    )));
                }
            },
            None => task.await,
        };

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                warn!("◆ Tool {} panicked: {}", name, message);
                return Ok(ToolResult::err(format!("Tool {} panicked: {}", name, message)));
            }
        };

        outcome.map_err(|e| DispatchError::InvalidArguments {
            tool: name.to_string(),
            message: e.0,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for building an argument mapping from a `json!` object
pub fn args_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
