//! Orchestration workflow
//!
//! Discovery, formatting, persistence, scoring and notification run in a
//! fixed order with no model in the loop. Persistence failure stops the
//! workflow; scoring and notification failures are recorded and skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::tools::{args_map, SharedTool, Tool, ToolError};

pub const DEFAULT_JOB_ID: &str = "orchestrator";

/// Which stages to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    /// Every stage
    Full,
    /// Discovery, formatting and persistence only
    Discover,
}

impl FromStr for WorkflowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(WorkflowType::Full),
            "discover" => Ok(WorkflowType::Discover),
            other => Err(format!("Unknown workflow type: {}", other)),
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowType::Full => f.write_str("full"),
            WorkflowType::Discover => f.write_str("discover"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub workflow_type: WorkflowType,
    /// Falls back to the orchestrator's configured sources
    pub sources: Option<Vec<String>>,
    pub job_id: Option<String>,
}

impl WorkflowRequest {
    pub fn full() -> Self {
        Self {
            workflow_type: WorkflowType::Full,
            sources: None,
            job_id: None,
        }
    }
}

/// A discovered item after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedListing {
    pub company: String,
    pub position: String,
    pub location: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discovery,
    Formatting,
    Persistence,
    Scoring,
    Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub stage: Stage,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome; `success` is false only when a fatal stage failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<WorkflowType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_discovered: usize,
    pub formatted: usize,
    pub dropped: usize,
    pub new_saved: usize,
    pub duplicates_filtered: usize,
    pub scored_count: usize,
    pub notified: bool,
    pub steps: Vec<StepResult>,
    pub workflow_complete: bool,
}

impl WorkflowResult {
    fn start(workflow_type: Option<WorkflowType>) -> Self {
        Self {
            success: true,
            workflow_type,
            error: None,
            total_discovered: 0,
            formatted: 0,
            dropped: 0,
            new_saved: 0,
            duplicates_filtered: 0,
            scored_count: 0,
            notified: false,
            steps: Vec::new(),
            workflow_complete: false,
        }
    }

    fn rejected(error: String) -> Self {
        let mut result = Self::start(None);
        result.success = false;
        result.error = Some(error);
        result
    }

    fn fatal(mut self, stage: Stage, error: String) -> Self {
        warn!("◆ Workflow stopped at {:?}: {}", stage, error);
        self.steps.push(StepResult {
            stage,
            success: false,
            data: None,
            error: Some(error.clone()),
        });
        self.success = false;
        self.error = Some(error);
        self
    }

    fn step_ok(&mut self, stage: Stage, data: Value) {
        self.steps.push(StepResult {
            stage,
            success: true,
            data: Some(data),
            error: None,
        });
    }

    fn step_degraded(&mut self, stage: Stage, error: String) {
        warn!("◆ Workflow stage {:?} degraded: {}", stage, error);
        self.steps.push(StepResult {
            stage,
            success: false,
            data: None,
            error: Some(error),
        });
    }

    /// Errors from stages that failed without stopping the workflow
    pub fn stage_errors(&self) -> Vec<(Stage, &str)> {
        self.steps
            .iter()
            .filter(|s| !s.success)
            .filter_map(|s| s.error.as_deref().map(|e| (s.stage, e)))
            .collect()
    }
}

/// Fixed pipeline over four collaborator tools
pub struct Orchestrator {
    discovery: SharedTool,
    persistence: SharedTool,
    scoring: SharedTool,
    notification: SharedTool,
    default_sources: Vec<String>,
    limit: usize,
}

impl Orchestrator {
    pub fn new(
        discovery: SharedTool,
        persistence: SharedTool,
        scoring: SharedTool,
        notification: SharedTool,
    ) -> Self {
        Self {
            discovery,
            persistence,
            scoring,
            notification,
            default_sources: Vec::new(),
            limit: 500,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.default_sources = sources;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Parse the type name first; an unknown type runs no stage
    pub async fn run_named(
        &self,
        workflow_type: &str,
        sources: Option<Vec<String>>,
        job_id: Option<String>,
    ) -> WorkflowResult {
        match workflow_type.parse::<WorkflowType>() {
            Ok(workflow_type) => {
                self.run(WorkflowRequest {
                    workflow_type,
                    sources,
                    job_id,
                })
                .await
            }
            Err(e) => WorkflowResult::rejected(e),
        }
    }

    pub async fn run(&self, request: WorkflowRequest) -> WorkflowResult {
        let mut result = WorkflowResult::start(Some(request.workflow_type));
        let job_id = request
            .job_id
            .unwrap_or_else(|| DEFAULT_JOB_ID.to_string());
        let sources = request
            .sources
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_sources.clone());

        info!(
            "◆ Workflow {} started for job {} ({} sources)",
            request.workflow_type,
            job_id,
            sources.len()
        );

        // 1. discovery
        let discovered = match self
            .call(
                &self.discovery,
                json!({ "repos": sources, "limit": self.limit }),
            )
            .await
        {
            Ok(data) => data,
            Err(e) => return result.fatal(Stage::Discovery, e),
        };
        let items = discovered
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        result.total_discovered = discovered
            .get("total_found")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(items.len());
        result.step_ok(
            Stage::Discovery,
            json!({ "total_found": result.total_discovered }),
        );

        // 2. formatting
        let (formatted, dropped) = format_items(&items);
        result.formatted = formatted.len();
        result.dropped = dropped;
        result.step_ok(
            Stage::Formatting,
            json!({ "formatted": formatted.len(), "dropped": dropped }),
        );

        if formatted.is_empty() {
            info!("◆ Workflow found nothing to save");
            result.workflow_complete = true;
            return result;
        }

        // 3. persistence
        let saved = match self
            .call(
                &self.persistence,
                json!({ "internships": formatted, "agent_job_id": job_id }),
            )
            .await
        {
            Ok(data) => data,
            Err(e) => return result.fatal(Stage::Persistence, e),
        };
        result.new_saved = count_field(&saved, "saved_count");
        result.duplicates_filtered = count_field(&saved, "duplicate_count");
        result.step_ok(Stage::Persistence, saved);

        if request.workflow_type == WorkflowType::Full {
            // 4. scoring
            match self.call(&self.scoring, json!({})).await {
                Ok(data) => {
                    result.scored_count = count_field(&data, "scored_count");
                    result.step_ok(Stage::Scoring, data);
                }
                Err(e) => {
                    result.scored_count = 0;
                    result.step_degraded(Stage::Scoring, e);
                }
            }

            // 5. notification
            let (subject, body) = summary_message(&result);
            match self
                .call(
                    &self.notification,
                    json!({ "subject": subject, "body": body }),
                )
                .await
            {
                Ok(data) => {
                    result.notified = true;
                    result.step_ok(Stage::Notification, data);
                }
                Err(e) => result.step_degraded(Stage::Notification, e),
            }
        }

        result.workflow_complete = true;
        info!(
            "◆ Workflow done: {} discovered, {} saved, {} duplicates, {} scored",
            result.total_discovered, result.new_saved, result.duplicates_filtered, result.scored_count
        );
        result
    }

    async fn call(&self, tool: &SharedTool, args: Value) -> Result<Value, String> {
        match tool.execute(args_map(args)).await {
            Ok(outcome) => outcome.into_result(),
            Err(e) => Err(format!("{} rejected arguments: {}", tool.name(), e)),
        }
    }
}

/// Normalize discovered items, dropping those without company or position
pub fn format_items(items: &[Value]) -> (Vec<FormattedListing>, usize) {
    let mut formatted = Vec::with_capacity(items.len());
    let mut dropped = 0;

    for item in items {
        let text = |key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let company = text("company");
        let position = {
            let p = text("position");
            if p.is_empty() {
                text("title")
            } else {
                p
            }
        };

        if company.is_empty() || position.is_empty() {
            dropped += 1;
            continue;
        }

        let source = text("source");
        formatted.push(FormattedListing {
            company,
            position,
            location: text("location"),
            url: text("url"),
            source: if source.is_empty() {
                "GitHub".to_string()
            } else {
                source
            },
        });
    }

    (formatted, dropped)
}

fn count_field(data: &Value, key: &str) -> usize {
    data.get(key).and_then(Value::as_u64).unwrap_or(0) as usize
}

fn summary_message(result: &WorkflowResult) -> (String, String) {
    let subject = format!("Internship workflow complete: {} new", result.new_saved);
    let mut body = format!(
        "**Discovered:** {}\n**Formatted:** {} ({} dropped)\n**New saved:** {}\n**Duplicates filtered:** {}\n**Scored:** {}",
        result.total_discovered,
        result.formatted,
        result.dropped,
        result.new_saved,
        result.duplicates_filtered,
        result.scored_count
    );
    for (stage, error) in result.stage_errors() {
        body.push_str(&format!("\n{:?} failed: {}", stage, error));
    }
    (subject, body)
}

/// Exposes the workflow as a tool inside agent runs
pub struct OrchestrateTool {
    orchestrator: Arc<Orchestrator>,
}

impl OrchestrateTool {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrchestrateArgs {
    #[serde(default)]
    workflow_type: Option<String>,
    #[serde(default)]
    repos: Option<Vec<String>>,
    #[serde(default)]
    agent_job_id: Option<String>,
}

#[async_trait]
impl Tool for OrchestrateTool {
    type Args = OrchestrateArgs;

    fn name(&self) -> &str {
        "orchestrate_workflow"
    }

    fn description(&self) -> &str {
        "Run the full discovery pipeline: monitor GitHub repos, save new internships, score them and send a summary. Args: {\"workflow_type\": \"full\"|\"discover\", \"repos\": [..]}"
    }

    async fn call(&self, args: OrchestrateArgs) -> Result<Value, ToolError> {
        let result = self
            .orchestrator
            .run_named(
                args.workflow_type.as_deref().unwrap_or("full"),
                args.repos,
                args.agent_job_id,
            )
            .await;

        if result.success {
            Ok(serde_json::to_value(&result)?)
        } else {
            Err(result
                .error
                .unwrap_or_else(|| "workflow failed".to_string())
                .into())
        }
    }
}
