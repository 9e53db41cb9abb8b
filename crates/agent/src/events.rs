//! Structured progress events from an agent run

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Classification of a non-success step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedModelOutput,
    InvalidAction,
    ToolExecution,
    ModelUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    TurnStarted {
        iteration: u32,
    },
    ModelReplied {
        iteration: u32,
        chars: usize,
    },
    ToolDispatched {
        iteration: u32,
        tool: String,
    },
    ToolCompleted {
        iteration: u32,
        tool: String,
        success: bool,
    },
    ErrorClassified {
        iteration: u32,
        kind: ErrorKind,
        detail: String,
    },
    Finished {
        iterations: u32,
        outcome: String,
    },
}

/// Logs every event and forwards it to an optional subscriber
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<AgentEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<AgentEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: AgentEvent) {
        match &event {
            AgentEvent::TurnStarted { iteration } => debug!("Agent iteration {}", iteration),
            AgentEvent::ModelReplied { iteration, chars } => {
                debug!("Model replied on iteration {} ({} chars)", iteration, chars)
            }
            AgentEvent::ToolDispatched { tool, .. } => info!("◆ Running tool: {}", tool),
            AgentEvent::ToolCompleted { tool, success, .. } => {
                debug!("Tool {} finished (success: {})", tool, success)
            }
            AgentEvent::ErrorClassified { kind, detail, .. } => {
                warn!("◆ {:?}: {}", kind, detail)
            }
            AgentEvent::Finished {
                iterations,
                outcome,
            } => info!("◆ Agent finished after {} iterations: {}", iterations, outcome),
        }

        if let Some(tx) = &self.tx {
            // receiver gone is fine
            let _ = tx.send(event);
        }
    }
}
