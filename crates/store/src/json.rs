//! JSON-file backed listing store

use crate::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    next_id: u64,
    listings: Vec<Listing>,
}

/// Listing store persisted as one JSON document
///
/// Without a path the store lives in memory only. Each call holds the lock
/// for its whole duration, so batch saves are never interleaved. A failed
/// write leaves the in-memory state as it was before the call.
pub struct JsonListingStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl JsonListingStore {
    /// Open (or create on first write) a store at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let state: StoreState = serde_json::from_str(&content)?;
            debug!("Loaded {} listings from {:?}", state.listings.len(), path);
            state
        } else {
            StoreState::default()
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn pair_key(title: &str, company: &str) -> (String, String) {
    (title.trim().to_string(), company.trim().to_string())
}

fn newest_first(a: &Listing, b: &Listing) -> Ordering {
    b.discovered_at
        .cmp(&a.discovered_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl ListingStore for JsonListingStore {
    async fn save_batch(&self, agent_job_id: &str, items: Vec<NewListing>) -> Result<SaveReport> {
        let mut state = self.state.lock().await;

        let mut urls: HashSet<String> = state
            .listings
            .iter()
            .filter_map(|l| l.url.clone())
            .collect();
        let mut pairs: HashSet<(String, String)> = state
            .listings
            .iter()
            .map(|l| pair_key(&l.title, &l.company))
            .collect();

        let mut report = SaveReport {
            total_processed: items.len(),
            ..Default::default()
        };
        let mut fresh = Vec::new();
        let now = Utc::now();
        let prev_next_id = state.next_id;

        for item in items {
            let (Some(title), Some(company)) = (item.resolved_title(), item.resolved_company())
            else {
                report.skipped_count += 1;
                continue;
            };

            let url = item.resolved_url().map(str::to_string);
            let key = pair_key(title, company);
            let url_seen = url.as_ref().map(|u| urls.contains(u)).unwrap_or(false);

            if url_seen || pairs.contains(&key) {
                report.duplicate_count += 1;
                continue;
            }

            state.next_id += 1;
            fresh.push(Listing {
                id: state.next_id,
                agent_job_id: agent_job_id.to_string(),
                title: key.0.clone(),
                company: key.1.clone(),
                url: url.clone(),
                location: item.location.clone().unwrap_or_default().trim().to_string(),
                description: truncate_chars(
                    item.description.as_deref().unwrap_or_default(),
                    MAX_DESCRIPTION_CHARS,
                ),
                source: item
                    .source
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "GitHub".to_string()),
                discovered_at: now,
                applied: false,
                relevance_score: 0.0,
            });

            if let Some(url) = url {
                urls.insert(url);
            }
            pairs.insert(key);
        }

        report.saved_count = fresh.len();
        if !fresh.is_empty() {
            let prev_len = state.listings.len();
            state.listings.extend(fresh);
            if let Err(e) = self.persist(&state).await {
                state.listings.truncate(prev_len);
                state.next_id = prev_next_id;
                return Err(e);
            }
        }

        info!(
            "◆ Saved {} listings ({} duplicates, {} skipped)",
            report.saved_count, report.duplicate_count, report.skipped_count
        );
        Ok(report)
    }

    async fn query(&self, query: ListingQuery) -> Result<Vec<Listing>> {
        let state = self.state.lock().await;
        let limit = query.limit();

        let mut rows: Vec<Listing> = match &query {
            ListingQuery::Recent { .. } => state.listings.clone(),
            ListingQuery::Search { query, .. } => {
                let needle = query.to_lowercase();
                state
                    .listings
                    .iter()
                    .filter(|l| {
                        l.title.to_lowercase().contains(&needle)
                            || l.company.to_lowercase().contains(&needle)
                            || l.location.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect()
            }
            ListingQuery::Unapplied { .. } => {
                state.listings.iter().filter(|l| !l.applied).cloned().collect()
            }
        };

        match query {
            ListingQuery::Unapplied { .. } => rows.sort_by(|a, b| {
                b.relevance_score
                    .partial_cmp(&a.relevance_score)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| newest_first(a, b))
            }),
            _ => rows.sort_by(newest_first),
        }

        rows.truncate(limit);
        Ok(rows)
    }

    async fn unscored(&self, ids: Option<&[u64]>) -> Result<Vec<Listing>> {
        let state = self.state.lock().await;
        let rows = match ids {
            Some(ids) => state
                .listings
                .iter()
                .filter(|l| ids.contains(&l.id))
                .cloned()
                .collect(),
            None => state
                .listings
                .iter()
                .filter(|l| !l.is_scored())
                .cloned()
                .collect(),
        };
        Ok(rows)
    }

    async fn set_scores(&self, scores: &[(u64, f64)]) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut previous = Vec::new();

        for (id, score) in scores {
            if let Some(listing) = state.listings.iter_mut().find(|l| l.id == *id) {
                previous.push((*id, listing.relevance_score));
                listing.relevance_score = *score;
            }
        }

        if !previous.is_empty() {
            if let Err(e) = self.persist(&state).await {
                // undo in reverse so repeated ids end on their original score
                for (id, score) in previous.iter().rev() {
                    if let Some(listing) = state.listings.iter_mut().find(|l| l.id == *id) {
                        listing.relevance_score = *score;
                    }
                }
                return Err(e);
            }
        }
        Ok(previous.len())
    }

    async fn contains(&self, title: &str, company: &str) -> Result<bool> {
        let state = self.state.lock().await;
        let key = pair_key(title, company);
        Ok(state
            .listings
            .iter()
            .any(|l| pair_key(&l.title, &l.company) == key))
    }

    async fn contains_url(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(false);
        }
        let state = self.state.lock().await;
        Ok(state.listings.iter().any(|l| l.url.as_deref() == Some(url)))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.lock().await.listings.len())
    }
}
