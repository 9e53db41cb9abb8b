//! Agent loop - turns a goal into a bounded sequence of tool calls

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use scout_provider::{ChatParams, Provider, ResponseFormat};

use crate::action::{decode_reply, Action, Decoded};
use crate::context::{ContextBuilder, Conversation};
use crate::events::{AgentEvent, ErrorKind, EventSink};
use crate::tools::{DispatchError, ToolRegistry};
use crate::{AgentError, Result};

/// Result text when the budget runs out
pub const EXHAUSTED_MESSAGE: &str = "Max iterations reached without completing goal";

/// Decoding parameters and budget
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.1,
            max_tokens: 2048,
            max_iterations: 15,
        }
    }
}

impl From<&scout_config::AgentConfig> for AgentSettings {
    fn from(config: &scout_config::AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_iterations,
        }
    }
}

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { summary: String },
    Exhausted,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub outcome: RunOutcome,
    pub conversation: Conversation,
    pub iterations: u32,
    pub tool_calls: u32,
}

impl AgentRun {
    /// The summary, or the exhaustion message
    pub fn message(&self) -> &str {
        match &self.outcome {
            RunOutcome::Completed { summary } => summary,
            RunOutcome::Exhausted => EXHAUSTED_MESSAGE,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }
}

/// Drives one goal to completion against a fixed tool set
pub struct AgentLoop<P: Provider + ?Sized> {
    provider: Arc<P>,
    tools: ToolRegistry,
    settings: AgentSettings,
    events: EventSink,
}

impl<P: Provider + ?Sized> AgentLoop<P> {
    pub fn new(provider: Arc<P>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            settings: AgentSettings::default(),
            events: EventSink::disabled(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<AgentEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run to a terminal state. Consumes the loop; a run is never resumed.
    pub async fn run(self, goal: &str) -> Result<AgentRun> {
        let model = if self.settings.model.is_empty() {
            self.provider.default_model()
        } else {
            self.settings.model.clone()
        };
        let tool_names = self.tools.names();
        let mut conversation =
            Conversation::new(ContextBuilder::system_prompt(&self.tools.descriptors()), goal);
        let mut tool_calls = 0;

        for iteration in 1..=self.settings.max_iterations {
            self.events.emit(AgentEvent::TurnStarted { iteration });

            let params = ChatParams {
                model: model.clone(),
                messages: conversation.turns().to_vec(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                response_format: ResponseFormat::Json,
            };

            let reply = match self.provider.chat(params).await {
                Ok(reply) => reply,
                Err(e) => {
                    self.classify(iteration, ErrorKind::ModelUnavailable, e.to_string());
                    self.finish(iteration, "failed");
                    return Err(AgentError::Provider(e.to_string()));
                }
            };

            let raw = reply.content.unwrap_or_default();
            self.events.emit(AgentEvent::ModelReplied {
                iteration,
                chars: raw.len(),
            });

            let decoded = match decode_reply(&raw) {
                Ok(decoded) => decoded,
                Err(reason) => {
                    self.classify(iteration, ErrorKind::MalformedModelOutput, reason.clone());
                    self.finish(iteration, "failed");
                    return Err(AgentError::MalformedModelOutput(reason));
                }
            };

            match decoded {
                Decoded::Action(Action::Completion { summary }) => {
                    self.finish(iteration, "completed");
                    return Ok(AgentRun {
                        outcome: RunOutcome::Completed { summary },
                        conversation,
                        iterations: iteration,
                        tool_calls,
                    });
                }
                Decoded::Incomplete => {
                    self.classify(
                        iteration,
                        ErrorKind::InvalidAction,
                        "reply has neither tool nor done".to_string(),
                    );
                    conversation.push_assistant(raw);
                    conversation.push_user(ContextBuilder::missing_action(&tool_names));
                }
                Decoded::Action(Action::ToolInvocation { tool, arguments }) => {
                    self.events.emit(AgentEvent::ToolDispatched {
                        iteration,
                        tool: tool.clone(),
                    });

                    let feedback = match self.tools.dispatch(&tool, arguments).await {
                        Ok(result) => {
                            tool_calls += 1;
                            self.events.emit(AgentEvent::ToolCompleted {
                                iteration,
                                tool: tool.clone(),
                                success: result.success,
                            });
                            if let Some(error) = result.error.as_ref().filter(|_| !result.success) {
                                self.classify(iteration, ErrorKind::ToolExecution, error.clone());
                            }
                            ContextBuilder::tool_result(&result)
                        }
                        Err(DispatchError::UnknownTool(name)) => {
                            self.classify(
                                iteration,
                                ErrorKind::InvalidAction,
                                format!("unknown tool {}", name),
                            );
                            ContextBuilder::unknown_tool(&name, &tool_names)
                        }
                        Err(DispatchError::InvalidArguments { tool, message }) => {
                            self.classify(
                                iteration,
                                ErrorKind::InvalidAction,
                                format!("bad arguments for {}: {}", tool, message),
                            );
                            ContextBuilder::invalid_arguments(&tool, &message)
                        }
                    };

                    conversation.push_assistant(raw);
                    conversation.push_user(feedback);
                }
            }
        }

        self.finish(self.settings.max_iterations, "exhausted");
        Ok(AgentRun {
            outcome: RunOutcome::Exhausted,
            conversation,
            iterations: self.settings.max_iterations,
            tool_calls,
        })
    }

    fn classify(&self, iteration: u32, kind: ErrorKind, detail: String) {
        self.events.emit(AgentEvent::ErrorClassified {
            iteration,
            kind,
            detail,
        });
    }

    fn finish(&self, iterations: u32, outcome: &str) {
        self.events.emit(AgentEvent::Finished {
            iterations,
            outcome: outcome.to_string(),
        });
    }
}
