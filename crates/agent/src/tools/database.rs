//! Listing storage tools: save_to_database and query_database

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use scout_store::{ListingQuery, ListingStore, NewListing};

use super::{Tool, ToolError};

pub struct SaveListingsTool {
    store: Arc<dyn ListingStore>,
}

impl SaveListingsTool {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveListingsArgs {
    internships: Vec<NewListing>,
    #[serde(default)]
    agent_job_id: Option<String>,
}

#[async_trait]
impl Tool for SaveListingsTool {
    type Args = SaveListingsArgs;

    fn name(&self) -> &str {
        "save_to_database"
    }

    fn description(&self) -> &str {
        "Save internships to the database, skipping duplicates by URL or title+company. Args: {\"internships\": [{\"company\", \"position\", \"location\", \"url\"}]}"
    }

    async fn call(&self, args: SaveListingsArgs) -> Result<Value, ToolError> {
        let job_id = args.agent_job_id.as_deref().unwrap_or("agent");
        debug!("Saving {} listings for job {}", args.internships.len(), job_id);

        let report = self.store.save_batch(job_id, args.internships).await?;
        Ok(serde_json::to_value(report)?)
    }
}

pub struct QueryListingsTool {
    store: Arc<dyn ListingStore>,
}

impl QueryListingsTool {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryListingsArgs {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait]
impl Tool for QueryListingsTool {
    type Args = QueryListingsArgs;

    fn name(&self) -> &str {
        "query_database"
    }

    fn description(&self) -> &str {
        "Query saved internships. Args: {\"action\": \"recent\"|\"search\"|\"unapplied\", \"query\": \"text\", \"limit\": 10}"
    }

    async fn call(&self, args: QueryListingsArgs) -> Result<Value, ToolError> {
        let action = args.action.as_deref().unwrap_or("recent");
        let query = ListingQuery::parse(action, args.query.as_deref(), args.limit)?;

        let rows = self.store.query(query).await?;
        let internships: Vec<Value> = rows
            .iter()
            .map(|l| {
                json!({
                    "id": l.id,
                    "title": l.title,
                    "company": l.company,
                    "location": l.location,
                    "url": l.url,
                    "applied": l.applied,
                    "relevance_score": l.relevance_score,
                })
            })
            .collect();

        Ok(json!({ "count": internships.len(), "internships": internships }))
    }
}
