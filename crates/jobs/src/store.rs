//! Job record storage

use crate::JobRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Concurrency-safe map of job id to record
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record; false if the id is already taken
    async fn insert(&self, record: JobRecord) -> bool;

    async fn get(&self, id: &str) -> Option<JobRecord>;

    /// Replace the stored record with the same id
    async fn put(&self, record: JobRecord);

    /// All records, newest first
    async fn list(&self) -> Vec<JobRecord>;
}

#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, record: JobRecord) -> bool {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&record.id) {
            return false;
        }
        jobs.insert(record.id.clone(), record);
        true
    }

    async fn get(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn put(&self, record: JobRecord) {
        self.jobs.write().await.insert(record.id.clone(), record);
    }

    async fn list(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}
