//! Agent core: tool contract, control loop and orchestration workflow

use thiserror::Error;

pub mod action;
pub mod context;
pub mod events;
pub mod loop_agent;
pub mod tools;
pub mod workflow;

pub use action::{decode_reply, Action, Decoded};
pub use context::{ContextBuilder, Conversation};
pub use events::{AgentEvent, ErrorKind, EventSink};
pub use loop_agent::{AgentLoop, AgentRun, AgentSettings, RunOutcome, EXHAUSTED_MESSAGE};
pub use tools::{
    DispatchError, NoArgs, SharedTool, Tool, ToolDescriptor, ToolRegistry, ToolResult, ToolTrait,
};
pub use workflow::{
    OrchestrateTool, Orchestrator, WorkflowRequest, WorkflowResult, WorkflowType,
};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid JSON response from LLM: {0}")]
    MalformedModelOutput(String),

    #[error("model request failed: {0}")]
    Provider(String),

    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
