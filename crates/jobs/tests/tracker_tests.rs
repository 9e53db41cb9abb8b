//! Integration tests for the job tracker

use async_trait::async_trait;
use scout_jobs::{
    InMemoryJobStore, JobError, JobKind, JobRecord, JobRunner, JobStatus, JobTracker, RunError,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

struct EchoRunner {
    calls: AtomicUsize,
}

#[async_trait]
impl JobRunner for EchoRunner {
    async fn run(&self, job_id: &str, goal: &str) -> Result<Value, RunError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "job_id": job_id, "summary": format!("did: {}", goal) }))
    }
}

struct FailingRunner;

#[async_trait]
impl JobRunner for FailingRunner {
    async fn run(&self, _job_id: &str, _goal: &str) -> Result<Value, RunError> {
        Err("model unreachable".into())
    }
}

struct PanickingRunner;

#[async_trait]
impl JobRunner for PanickingRunner {
    async fn run(&self, _job_id: &str, _goal: &str) -> Result<Value, RunError> {
        panic!("tool blew up");
    }
}

/// Blocks until released so intermediate states can be observed
struct GatedRunner {
    gate: Arc<Notify>,
}

#[async_trait]
impl JobRunner for GatedRunner {
    async fn run(&self, _job_id: &str, _goal: &str) -> Result<Value, RunError> {
        self.gate.notified().await;
        Ok(json!("released"))
    }
}

fn tracker(runner: Arc<dyn JobRunner>) -> JobTracker {
    JobTracker::new(Arc::new(InMemoryJobStore::new()), runner)
}

async fn wait_terminal(tracker: &JobTracker, id: &str) -> JobRecord {
    for _ in 0..200 {
        let record = tracker.get(id).await.unwrap();
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never finished", id);
}

#[tokio::test]
async fn test_submit_completes() {
    let runner = Arc::new(EchoRunner {
        calls: AtomicUsize::new(0),
    });
    let tracker = tracker(runner.clone());

    let id = tracker.submit("find rust internships").await;
    assert_eq!(id.len(), 8);

    let record = wait_terminal(&tracker, &id).await;
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.kind, JobKind::Agent);
    assert_eq!(
        record.result.unwrap()["summary"],
        "did: find rust internships"
    );
    assert!(record.started_at.is_some());
    assert!(record.completed_at.is_some());
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_runner_error_marks_failed() {
    let tracker = tracker(Arc::new(FailingRunner));
    let id = tracker.submit("anything").await;

    let record = wait_terminal(&tracker, &id).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("model unreachable"));
    assert!(record.result.is_none());
}

#[tokio::test]
async fn test_runner_panic_marks_failed() {
    let tracker = tracker(Arc::new(PanickingRunner));
    let id = tracker.submit("anything").await;

    let record = wait_terminal(&tracker, &id).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("tool blew up"));
}

#[tokio::test]
async fn test_submit_returns_before_run_finishes() {
    let gate = Arc::new(Notify::new());
    let tracker = tracker(Arc::new(GatedRunner { gate: gate.clone() }));

    let id = tracker.submit("slow").await;
    let record = tracker.get(&id).await.unwrap();
    assert!(matches!(
        record.status,
        JobStatus::Queued | JobStatus::Running
    ));

    gate.notify_one();
    let record = wait_terminal(&tracker, &id).await;
    assert_eq!(record.result, Some(json!("released")));
}

#[tokio::test]
async fn test_identical_goals_get_independent_jobs() {
    let runner = Arc::new(EchoRunner {
        calls: AtomicUsize::new(0),
    });
    let tracker = tracker(runner.clone());

    let a = tracker.submit("same goal").await;
    let b = tracker.submit("same goal").await;
    assert_ne!(a, b);

    wait_terminal(&tracker, &a).await;
    wait_terminal(&tracker, &b).await;
    assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.list().await.len(), 2);
}

#[tokio::test]
async fn test_get_unknown_job() {
    let tracker = tracker(Arc::new(FailingRunner));
    assert_eq!(
        tracker.get("nope").await.unwrap_err(),
        JobError::NotFound("nope".to_string())
    );
}

#[tokio::test]
async fn test_submit_with_other_runner_and_kind() {
    let tracker = tracker(Arc::new(FailingRunner));
    let id = tracker
        .submit_with(
            JobKind::Workflow,
            "full",
            Arc::new(EchoRunner {
                calls: AtomicUsize::new(0),
            }),
        )
        .await;

    let record = wait_terminal(&tracker, &id).await;
    assert_eq!(record.kind, JobKind::Workflow);
    assert_eq!(record.status, JobStatus::Completed);
}
