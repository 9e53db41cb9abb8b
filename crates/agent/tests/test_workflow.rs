//! Tests for the orchestration workflow using stub stage tools

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

use scout_agent::tools::{ArgumentError, ToolResult};
use scout_agent::workflow::{format_items, Stage};
use scout_agent::{OrchestrateTool, Orchestrator, SharedTool, ToolRegistry, ToolTrait, WorkflowType};

/// Returns a canned result and records every call
struct StubTool {
    name: &'static str,
    result: ToolResult,
    calls: Mutex<Vec<Map<String, Value>>>,
}

impl StubTool {
    fn ok(name: &'static str, data: Value) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: ToolResult::ok(data),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(name: &'static str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: ToolResult::err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolTrait for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "stub"
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ArgumentError> {
        self.calls.lock().unwrap().push(args);
        Ok(self.result.clone())
    }
}

fn items(valid: usize, invalid: usize) -> Vec<Value> {
    let mut out: Vec<Value> = (0..valid)
        .map(|i| {
            json!({
                "company": format!("Company {}", i),
                "position": "Software Engineer Intern",
                "location": "Remote",
                "url": format!("https://example.com/{}", i),
                "source": "SimplifyJobs",
            })
        })
        .collect();
    out.extend((0..invalid).map(|_| json!({ "company": "", "position": "Intern" })));
    out
}

struct Stages {
    discovery: Arc<StubTool>,
    persistence: Arc<StubTool>,
    scoring: Arc<StubTool>,
    notification: Arc<StubTool>,
}

impl Stages {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.discovery.clone() as SharedTool,
            self.persistence.clone() as SharedTool,
            self.scoring.clone() as SharedTool,
            self.notification.clone() as SharedTool,
        )
        .with_sources(vec!["SimplifyJobs".to_string()])
    }
}

fn healthy(discovered: Vec<Value>) -> Stages {
    Stages {
        discovery: StubTool::ok(
            "monitor_github_internships",
            json!({ "total_found": discovered.len(), "items": discovered }),
        ),
        persistence: StubTool::ok(
            "save_to_database",
            json!({ "saved_count": 3, "duplicate_count": 0, "skipped_count": 0, "total_processed": 3 }),
        ),
        scoring: StubTool::ok("match_resume", json!({ "scored_count": 3 })),
        notification: StubTool::ok("send_notification", json!({ "delivered_via": "outbox" })),
    }
}

#[tokio::test]
async fn test_full_workflow_happy_path() {
    let stages = healthy(items(3, 0));
    let result = stages.orchestrator().run_named("full", None, Some("job1".into())).await;

    assert!(result.success);
    assert!(result.workflow_complete);
    assert_eq!(result.workflow_type, Some(WorkflowType::Full));
    assert_eq!(result.total_discovered, 3);
    assert_eq!(result.new_saved, 3);
    assert_eq!(result.scored_count, 3);
    assert!(result.notified);
    assert_eq!(result.steps.len(), 5);

    let discovery_args = &stages.discovery.calls()[0];
    assert_eq!(discovery_args["repos"], json!(["SimplifyJobs"]));
    assert_eq!(discovery_args["limit"], json!(500));

    let saved_args = &stages.persistence.calls()[0];
    assert_eq!(saved_args["agent_job_id"], json!("job1"));
    assert_eq!(saved_args["internships"].as_array().unwrap().len(), 3);

    let note = &stages.notification.calls()[0];
    assert!(note["subject"].as_str().unwrap().contains("3 new"));
}

#[tokio::test]
async fn test_scoring_failure_is_degraded() {
    let mut stages = healthy(items(490, 10));
    stages.discovery = StubTool::ok(
        "monitor_github_internships",
        json!({ "total_found": 500, "items": items(490, 10) }),
    );
    stages.persistence = StubTool::ok(
        "save_to_database",
        json!({ "saved_count": 400, "duplicate_count": 90, "skipped_count": 0, "total_processed": 490 }),
    );
    stages.scoring = StubTool::failing("match_resume", "resume unreadable");

    let result = stages.orchestrator().run_named("full", None, None).await;

    assert!(result.success);
    assert!(result.workflow_complete);
    assert_eq!(result.total_discovered, 500);
    assert_eq!(result.formatted, 490);
    assert_eq!(result.dropped, 10);
    assert_eq!(result.new_saved, 400);
    assert_eq!(result.duplicates_filtered, 90);
    assert_eq!(result.scored_count, 0);
    assert!(result.notified);
    assert_eq!(
        result.stage_errors(),
        vec![(Stage::Scoring, "resume unreadable")]
    );

    assert_eq!(stages.persistence.calls()[0]["agent_job_id"], json!("orchestrator"));
    let body = stages.notification.calls()[0]["body"].as_str().unwrap().to_string();
    assert!(body.contains("**Discovered:** 500"));
    assert!(body.contains("**Formatted:** 490 (10 dropped)"));
    assert!(body.contains("**New saved:** 400"));
    assert!(body.contains("**Duplicates filtered:** 90"));
    assert!(body.contains("resume unreadable"));
}

#[tokio::test]
async fn test_discovery_failure_is_fatal() {
    let mut stages = healthy(vec![]);
    stages.discovery = StubTool::failing("monitor_github_internships", "network down");

    let result = stages.orchestrator().run_named("full", None, None).await;

    assert!(!result.success);
    assert!(!result.workflow_complete);
    assert_eq!(result.error.as_deref(), Some("network down"));
    assert!(stages.persistence.calls().is_empty());
    assert!(stages.notification.calls().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_is_fatal() {
    let mut stages = healthy(items(2, 0));
    stages.persistence = StubTool::failing("save_to_database", "disk full");

    let result = stages.orchestrator().run_named("full", None, None).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("disk full"));
    assert!(stages.scoring.calls().is_empty());
    assert!(stages.notification.calls().is_empty());
}

#[tokio::test]
async fn test_notification_failure_is_degraded() {
    let mut stages = healthy(items(3, 0));
    stages.notification = StubTool::failing("send_notification", "no channel");

    let result = stages.orchestrator().run_named("full", None, None).await;

    assert!(result.success);
    assert!(!result.notified);
    assert_eq!(
        result.stage_errors(),
        vec![(Stage::Notification, "no channel")]
    );
}

#[tokio::test]
async fn test_empty_discovery_short_circuits() {
    let stages = healthy(items(0, 4));
    let result = stages.orchestrator().run_named("full", None, None).await;

    assert!(result.success);
    assert!(result.workflow_complete);
    assert_eq!(result.dropped, 4);
    assert!(stages.persistence.calls().is_empty());
    assert!(stages.scoring.calls().is_empty());
    assert!(stages.notification.calls().is_empty());
}

#[tokio::test]
async fn test_discover_skips_scoring_and_notification() {
    let stages = healthy(items(3, 0));
    let result = stages
        .orchestrator()
        .run_named("discover", Some(vec!["Pitt-CSC".to_string()]), None)
        .await;

    assert!(result.success);
    assert_eq!(result.new_saved, 3);
    assert_eq!(stages.discovery.calls()[0]["repos"], json!(["Pitt-CSC"]));
    assert!(stages.scoring.calls().is_empty());
    assert!(stages.notification.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_workflow_type_runs_nothing() {
    let stages = healthy(items(3, 0));
    let result = stages.orchestrator().run_named("weekly", None, None).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Unknown workflow type: weekly"));
    assert!(stages.discovery.calls().is_empty());
}

#[test]
fn test_format_items_fallbacks() {
    let (formatted, dropped) = format_items(&[
        json!({ "company": " Acme ", "title": "Data Intern" }),
        json!({ "company": "Acme" }),
        json!("not an object"),
    ]);

    assert_eq!(dropped, 2);
    assert_eq!(formatted.len(), 1);
    assert_eq!(formatted[0].company, "Acme");
    assert_eq!(formatted[0].position, "Data Intern");
    assert_eq!(formatted[0].source, "GitHub");
}

#[tokio::test]
async fn test_orchestrate_tool_dispatch() {
    let stages = healthy(items(1, 0));
    let mut registry = ToolRegistry::new();
    registry
        .register(OrchestrateTool::new(Arc::new(stages.orchestrator())))
        .unwrap();

    let ok = registry
        .dispatch("orchestrate_workflow", json!({ "workflow_type": "discover" }))
        .await
        .unwrap();
    assert!(ok.success);
    assert_eq!(ok.data.unwrap()["workflow_type"], json!("discover"));

    let bad = registry
        .dispatch("orchestrate_workflow", json!({ "workflow_type": "nightly" }))
        .await
        .unwrap();
    assert!(!bad.success);
    assert_eq!(bad.error.as_deref(), Some("Unknown workflow type: nightly"));
}
