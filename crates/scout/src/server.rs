//! HTTP job API
//!
//! Jobs are submitted and return immediately with an id; clients poll
//! `GET /jobs/:id` for the record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scout_agent::{Orchestrator, WorkflowType};
use scout_jobs::{JobKind, JobStatus, JobTracker};

use crate::runner::WorkflowJobRunner;

/// Shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tracker: JobTracker,
    pub orchestrator: Arc<Orchestrator>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(tracker: JobTracker, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            tracker,
            orchestrator,
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobRequest {
    pub goal: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowRequestBody {
    #[serde(default)]
    pub workflow_type: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
    pub message: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/jobs/:id", get(get_job))
        .route("/workflows", post(create_workflow))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("◆ Job API listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("◆ Shutdown signal received");
        })
        .await?;

    info!("◆ Job API stopped");
    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "scout",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /jobs": "Start an agent job for a goal",
            "GET /jobs": "List jobs",
            "GET /jobs/:id": "Get job status and result",
            "POST /workflows": "Start the discovery workflow",
            "GET /health": "Health check",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn create_job(State(state): State<AppState>, Json(req): Json<JobRequest>) -> Response {
    let goal = req.goal.trim();
    if goal.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "goal is required");
    }

    let job_id = state.tracker.submit(goal).await;
    Json(JobAccepted {
        job_id,
        status: JobStatus::Queued,
        message: "Multi-agent system started",
    })
    .into_response()
}

async fn create_workflow(
    State(state): State<AppState>,
    body: Option<Json<WorkflowRequestBody>>,
) -> Response {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let workflow_type = match req
        .workflow_type
        .as_deref()
        .unwrap_or("full")
        .parse::<WorkflowType>()
    {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let runner = Arc::new(WorkflowJobRunner::new(
        state.orchestrator.clone(),
        req.sources,
    ));
    let job_id = state
        .tracker
        .submit_with(JobKind::Workflow, workflow_type.to_string(), runner)
        .await;

    Json(JobAccepted {
        job_id,
        status: JobStatus::Queued,
        message: "Workflow started",
    })
    .into_response()
}

async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.tracker.get(&id).await {
        Ok(record) => Json(record).into_response(),
        Err(_) => error_response(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn list_jobs(State(state): State<AppState>) -> Json<serde_json::Value> {
    let jobs = state.tracker.list().await;
    Json(json!({ "count": jobs.len(), "jobs": jobs }))
}
