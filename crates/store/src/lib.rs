//! Listing persistence
//!
//! Stores discovered internship listings, deduplicating by URL and by
//! (title, company). Every call is atomic with respect to other calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod json;

pub use json::JsonListingStore;

/// Longest description kept on a listing, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Default row cap for queries
pub const DEFAULT_QUERY_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown query action: {0}")]
    UnknownAction(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A persisted listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub agent_job_id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub source: String,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub applied: bool,
    #[serde(default)]
    pub relevance_score: f64,
}

impl Listing {
    pub fn is_scored(&self) -> bool {
        self.relevance_score > 0.0
    }
}

/// A listing as produced by discovery, before it has an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    #[serde(default)]
    pub title: Option<String>,
    /// Alternate name for `title` used by discovery sources
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl NewListing {
    /// Title, falling back to position. Blank values count as missing.
    pub fn resolved_title(&self) -> Option<&str> {
        non_blank(self.title.as_deref()).or_else(|| non_blank(self.position.as_deref()))
    }

    pub fn resolved_company(&self) -> Option<&str> {
        non_blank(self.company.as_deref())
    }

    pub fn resolved_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of a batch save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub saved_count: usize,
    pub duplicate_count: usize,
    /// Items without a title or company
    pub skipped_count: usize,
    pub total_processed: usize,
}

/// Read queries over stored listings
#[derive(Debug, Clone, PartialEq)]
pub enum ListingQuery {
    /// Newest first
    Recent { limit: usize },
    /// Case-insensitive match on title, company or location
    Search { query: String, limit: usize },
    /// Not yet applied to, best score first
    Unapplied { limit: usize },
}

impl ListingQuery {
    /// Build from the wire form used by tools and the CLI
    pub fn parse(action: &str, query: Option<&str>, limit: Option<usize>) -> Result<Self> {
        let limit = limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        match action {
            "recent" => Ok(ListingQuery::Recent { limit }),
            "search" => Ok(ListingQuery::Search {
                query: query.unwrap_or_default().to_string(),
                limit,
            }),
            "unapplied" => Ok(ListingQuery::Unapplied { limit }),
            other => Err(StoreError::UnknownAction(other.to_string())),
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            ListingQuery::Recent { limit }
            | ListingQuery::Search { limit, .. }
            | ListingQuery::Unapplied { limit } => *limit,
        }
    }
}

/// Listing storage backend
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Persist new listings, skipping duplicates of stored or earlier batch items
    async fn save_batch(&self, agent_job_id: &str, items: Vec<NewListing>) -> Result<SaveReport>;

    async fn query(&self, query: ListingQuery) -> Result<Vec<Listing>>;

    /// Listings with no score yet, or exactly `ids` when given
    async fn unscored(&self, ids: Option<&[u64]>) -> Result<Vec<Listing>>;

    /// Apply scores; returns how many listings were updated
    async fn set_scores(&self, scores: &[(u64, f64)]) -> Result<usize>;

    /// Whether a listing with this title and company is stored
    async fn contains(&self, title: &str, company: &str) -> Result<bool>;

    /// Whether a listing with this url is stored
    async fn contains_url(&self, url: &str) -> Result<bool>;

    async fn count(&self) -> Result<usize>;
}

/// Truncate to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
