//! Fire-and-forget job execution

use crate::{new_job_id, JobError, JobKind, JobRecord, JobStore, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info};

pub type RunError = Box<dyn std::error::Error + Send + Sync>;

/// Work executed for a job
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job_id: &str, goal: &str) -> std::result::Result<Value, RunError>;
}

/// Submits jobs and answers status lookups
#[derive(Clone)]
pub struct JobTracker {
    store: Arc<dyn JobStore>,
    runner: Arc<dyn JobRunner>,
}

impl JobTracker {
    /// `runner` handles plain [`submit`](Self::submit) calls
    pub fn new(store: Arc<dyn JobStore>, runner: Arc<dyn JobRunner>) -> Self {
        Self { store, runner }
    }

    /// Queue an agent job for `goal` and return its id immediately
    pub async fn submit(&self, goal: impl Into<String>) -> String {
        self.submit_with(JobKind::Agent, goal, self.runner.clone())
            .await
    }

    /// Queue a job of `kind` executed by `runner`
    pub async fn submit_with(
        &self,
        kind: JobKind,
        goal: impl Into<String>,
        runner: Arc<dyn JobRunner>,
    ) -> String {
        let goal = goal.into();

        let record = loop {
            let record = JobRecord::new(new_job_id(), kind, goal.clone());
            if self.store.insert(record.clone()).await {
                break record;
            }
        };

        let id = record.id.clone();
        info!("◆ Job {} queued ({:?})", id, kind);

        tokio::spawn(drive(self.store.clone(), runner, record));
        id
    }

    pub async fn get(&self, job_id: &str) -> Result<JobRecord> {
        self.store
            .get(job_id)
            .await
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    pub async fn list(&self) -> Vec<JobRecord> {
        self.store.list().await
    }
}

/// Owns one record from queued to terminal
async fn drive(store: Arc<dyn JobStore>, runner: Arc<dyn JobRunner>, mut record: JobRecord) {
    record.start();
    store.put(record.clone()).await;
    debug!("Job {} running", record.id);

    let job_id = record.id.clone();
    let goal = record.goal.clone();
    let outcome = tokio::spawn(async move { runner.run(&job_id, &goal).await }).await;

    match outcome {
        Ok(Ok(value)) => {
            info!("◆ Job {} completed", record.id);
            record.complete(value);
        }
        Ok(Err(e)) => {
            error!("◆ Job {} failed: {}", record.id, e);
            record.fail(e.to_string());
        }
        Err(join_err) => {
            let message = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                "job task cancelled".to_string()
            };
            error!("◆ Job {} panicked: {}", record.id, message);
            record.fail(message);
        }
    }

    store.put(record).await;
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
