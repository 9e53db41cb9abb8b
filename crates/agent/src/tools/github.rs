//! GitHub internship list monitoring: monitor_github_internships and detect_github_changes

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use scout_store::ListingStore;

use super::{Tool, ToolError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_LIMIT: usize = 500;
const INTERNSHIP_KEYWORDS: &[&str] = &["intern", "co-op", "coop", "summer", "spring", "fall"];

const HTML_ROW: &str = r#"(?s)<td><strong><a[^>]*>([^<]+)</a></strong></td>\s*<td>([^<]+)</td>\s*<td>([^<]+)</td>\s*<td[^>]*>.*?href="([^"]+)""#;
const MARKDOWN_ROW: &str =
    r"\|\s*\[([^\]]+)\]\([^)]+\)\s*\|\s*([^|]+)\|\s*([^|]+)\|\s*\[Apply\]\(([^)]+)\)";

/// A README that tracks internship postings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSource {
    pub name: String,
    pub readme_url: String,
}

impl GithubSource {
    pub fn new(name: impl Into<String>, readme_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readme_url: readme_url.into(),
        }
    }

    /// The community-maintained lists checked by default
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "SimplifyJobs",
                "https://raw.githubusercontent.com/SimplifyJobs/Summer2026-Internships/dev/README.md",
            ),
            Self::new(
                "Pitt-CSC",
                "https://raw.githubusercontent.com/pittcsc/Summer2026-Internships/dev/README.md",
            ),
            Self::new(
                "SpeedyApply",
                "https://raw.githubusercontent.com/speedyapply/2026-SWE-College-Jobs/main/README.md",
            ),
        ]
    }
}

/// One posting scraped from a README
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub company: String,
    pub position: String,
    pub location: String,
    pub url: String,
    pub source: String,
}

fn is_internship(position: &str) -> bool {
    let lower = position.to_lowercase();
    INTERNSHIP_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Extract internship rows from README content, HTML tables first
pub fn parse_postings(content: &str, source: &str) -> Vec<Posting> {
    let mut postings = Vec::new();

    if let Ok(re) = Regex::new(HTML_ROW) {
        for cap in re.captures_iter(content) {
            let url = cap[4].trim();
            // Simplify's company pages are not applications
            if url.contains("simplify.jobs") && url.contains("/c/") {
                continue;
            }
            let position = cap[2].trim();
            if !is_internship(position) {
                continue;
            }
            postings.push(Posting {
                company: cap[1].trim().to_string(),
                position: position.to_string(),
                location: cap[3].trim().to_string(),
                url: url.to_string(),
                source: source.to_string(),
            });
        }
    }

    if !postings.is_empty() {
        return postings;
    }

    if let Ok(re) = Regex::new(MARKDOWN_ROW) {
        for cap in re.captures_iter(content) {
            let position = cap[2].trim();
            if !is_internship(position) {
                continue;
            }
            postings.push(Posting {
                company: cap[1].trim().to_string(),
                position: position.to_string(),
                location: cap[3].trim().to_string(),
                url: cap[4].trim().to_string(),
                source: source.to_string(),
            });
        }
    }

    postings
}

pub struct GithubMonitorTool {
    sources: Vec<GithubSource>,
    client: reqwest::Client,
}

impl GithubMonitorTool {
    pub fn new(sources: Vec<GithubSource>) -> Self {
        Self {
            sources,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, source: &GithubSource) -> Result<String, ToolError> {
        let response = self
            .client
            .get(&source.readme_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} returned {}", source.name, status).into());
        }
        Ok(response.text().await?)
    }
}

impl Default for GithubMonitorTool {
    fn default() -> Self {
        Self::new(GithubSource::defaults())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GithubMonitorArgs {
    #[serde(default)]
    repos: Option<Vec<String>>,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait]
impl Tool for GithubMonitorTool {
    type Args = GithubMonitorArgs;

    fn name(&self) -> &str {
        "monitor_github_internships"
    }

    fn description(&self) -> &str {
        "Fetch internship postings from GitHub tracking repos. Args: {\"repos\": [\"SimplifyJobs\", \"Pitt-CSC\", \"SpeedyApply\"], \"limit\": 500}"
    }

    async fn call(&self, args: GithubMonitorArgs) -> Result<Value, ToolError> {
        let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
        let selected: Vec<&GithubSource> = match &args.repos {
            Some(names) if !names.is_empty() => self
                .sources
                .iter()
                .filter(|s| names.iter().any(|n| n == &s.name))
                .collect(),
            _ => self.sources.iter().collect(),
        };

        if selected.is_empty() {
            return Err(format!(
                "No known repos among {:?}",
                args.repos.unwrap_or_default()
            )
            .into());
        }

        let mut items: Vec<Posting> = Vec::new();
        let mut repo_data = serde_json::Map::new();
        let mut failures = 0;

        for source in &selected {
            match self.fetch(source).await {
                Ok(content) => {
                    let found = parse_postings(&content, &source.name);
                    debug!("{} listed {} postings", source.name, found.len());
                    repo_data.insert(source.name.clone(), json!({ "count": found.len() }));
                    items.extend(found);
                }
                Err(e) => {
                    warn!("◆ Failed to fetch {}: {}", source.name, e);
                    repo_data.insert(source.name.clone(), json!({ "error": e.to_string() }));
                    failures += 1;
                }
            }
        }

        if failures == selected.len() {
            return Err("Could not fetch any GitHub repo".into());
        }

        let total_found = items.len();
        items.truncate(limit);
        info!(
            "◆ GitHub monitor: {} postings from {} repos",
            total_found,
            selected.len()
        );

        Ok(json!({
            "total_found": total_found,
            "repos_checked": selected.len(),
            "items": items,
            "repo_data": repo_data,
        }))
    }
}

/// Reports which postings are not in the store yet
pub struct DetectChangesTool {
    store: Arc<dyn ListingStore>,
}

impl DetectChangesTool {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
pub struct CandidatePosting {
    #[serde(default, alias = "title")]
    position: String,
    #[serde(default)]
    company: String,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DetectChangesArgs {
    current_postings: Vec<CandidatePosting>,
}

#[async_trait]
impl Tool for DetectChangesTool {
    type Args = DetectChangesArgs;

    fn name(&self) -> &str {
        "detect_github_changes"
    }

    fn description(&self) -> &str {
        "Find postings that are not in the database yet. Args: {\"current_postings\": [{\"company\", \"position\", ...}]}"
    }

    async fn call(&self, args: DetectChangesArgs) -> Result<Value, ToolError> {
        let mut new_postings = Vec::new();

        for posting in args.current_postings {
            if self.store.contains(&posting.position, &posting.company).await? {
                continue;
            }
            let mut entry = posting.rest;
            entry.insert("company".to_string(), Value::String(posting.company));
            entry.insert("position".to_string(), Value::String(posting.position));
            new_postings.push(Value::Object(entry));
        }

        Ok(json!({
            "new_count": new_postings.len(),
            "alert_needed": !new_postings.is_empty(),
            "new_postings": new_postings,
        }))
    }
}
