//! Applicant tracking system boards: monitor_ats and detect_ats_changes
//!
//! Only Greenhouse is supported. Each board serves its openings as JSON at
//! `<board>/jobs?format=json`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use scout_store::{truncate_chars, ListingStore, MAX_DESCRIPTION_CHARS};

use super::{Tool, ToolError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_DELAY: Duration = Duration::from_secs(3);
const INTERN_KEYWORDS: &[&str] = &[
    "intern",
    "internship",
    "co-op",
    "coop",
    "student",
    "summer",
    "fall",
    "spring",
    "new grad",
    "graduate",
];

/// A company's Greenhouse job board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenhouseBoard {
    pub company: String,
    pub board_url: String,
}

impl GreenhouseBoard {
    pub fn new(company: impl Into<String>, board_url: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            board_url: board_url.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        [
            "stripe",
            "reddit",
            "twitch",
            "robinhood",
            "coinbase",
            "square",
            "dropbox",
            "notion",
        ]
        .into_iter()
        .map(|c| Self::new(c, format!("https://boards.greenhouse.io/{}", c)))
        .collect()
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs?format=json", self.board_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Default, Deserialize)]
struct BoardPayload {
    #[serde(default)]
    jobs: Vec<BoardJob>,
}

#[derive(Debug, Default, Deserialize)]
struct BoardJob {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    location: Value,
    #[serde(default)]
    absolute_url: String,
    #[serde(default)]
    departments: Vec<Department>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Department {
    #[serde(default)]
    name: String,
}

/// One opening taken from a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtsJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub department: String,
    pub source: String,
    pub ats_id: String,
    pub description: String,
}

pub fn is_internship(title: &str) -> bool {
    let title = title.to_lowercase();
    INTERN_KEYWORDS.iter().any(|k| title.contains(k))
}

/// Pull openings out of a Greenhouse board payload
pub fn parse_board(payload: &str, company: &str, internships_only: bool) -> Vec<AtsJob> {
    let board: BoardPayload = match serde_json::from_str(payload) {
        Ok(board) => board,
        Err(e) => {
            warn!("◆ {} board is not valid JSON: {}", company, e);
            return Vec::new();
        }
    };
    debug!("{} board lists {} jobs", company, board.jobs.len());

    board
        .jobs
        .into_iter()
        .filter(|job| !internships_only || is_internship(&job.title))
        .map(|job| {
            let location = match &job.location {
                Value::Object(loc) => loc
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Value::String(s) => s.clone(),
                _ => String::new(),
            };
            let ats_id = match &job.id {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let description = match job.content.as_deref().filter(|c| !c.is_empty()) {
                Some(content) => format!("{}...", truncate_chars(content, MAX_DESCRIPTION_CHARS)),
                None => String::new(),
            };

            AtsJob {
                title: job.title,
                company: company.to_string(),
                location,
                url: job.absolute_url,
                department: job
                    .departments
                    .into_iter()
                    .next()
                    .map(|d| d.name)
                    .unwrap_or_default(),
                source: "greenhouse".to_string(),
                ats_id,
                description,
            }
        })
        .collect()
}

/// Result of polling a set of boards
#[derive(Debug, Default)]
pub struct BoardScan {
    pub jobs: Vec<AtsJob>,
    pub checked: Vec<String>,
    pub errors: serde_json::Map<String, Value>,
}

/// Polls Greenhouse boards, one at a time with a pause between requests
pub struct GreenhouseClient {
    boards: Vec<GreenhouseBoard>,
    client: reqwest::Client,
    delay: Duration,
}

impl GreenhouseClient {
    pub fn new(boards: Vec<GreenhouseBoard>) -> Self {
        Self {
            boards,
            client: reqwest::Client::new(),
            delay: REQUEST_DELAY,
        }
    }

    /// Pause between board requests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn fetch(&self, board: &GreenhouseBoard) -> Result<String, ToolError> {
        let response = self
            .client
            .get(board.jobs_url())
            .header("Accept", "application/json")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} board returned {}", board.company, status).into());
        }
        Ok(response.text().await?)
    }

    /// Poll the named companies (case-insensitive), or every board when none are given
    pub async fn scan(&self, companies: Option<&[String]>, internships_only: bool) -> BoardScan {
        let wanted: Option<Vec<String>> = companies
            .filter(|c| !c.is_empty())
            .map(|c| c.iter().map(|n| n.trim().to_lowercase()).collect());

        let selected: Vec<&GreenhouseBoard> = self
            .boards
            .iter()
            .filter(|b| match &wanted {
                Some(names) => names.contains(&b.company.to_lowercase()),
                None => true,
            })
            .collect();

        let mut scan = BoardScan::default();
        for (i, board) in selected.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            scan.checked.push(board.company.clone());
            match self.fetch(board).await {
                Ok(payload) => {
                    let jobs = parse_board(&payload, &board.company, internships_only);
                    debug!("{}: {} matching openings", board.company, jobs.len());
                    scan.jobs.extend(jobs);
                }
                Err(e) => {
                    warn!("◆ Failed to check {}: {}", board.company, e);
                    scan.errors
                        .insert(board.company.clone(), Value::String(e.to_string()));
                }
            }
        }

        info!(
            "◆ ATS monitor: {} openings from {} boards",
            scan.jobs.len(),
            scan.checked.len()
        );
        scan
    }
}

impl Default for GreenhouseClient {
    fn default() -> Self {
        Self::new(GreenhouseBoard::defaults())
    }
}

pub struct AtsMonitorTool {
    client: Arc<GreenhouseClient>,
}

impl AtsMonitorTool {
    pub fn new(client: Arc<GreenhouseClient>) -> Self {
        Self { client }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AtsMonitorArgs {
    #[serde(default)]
    companies: Option<Vec<String>>,
    #[serde(default)]
    ats_type: Option<String>,
    #[serde(default = "default_true")]
    check_internships_only: bool,
}

#[async_trait]
impl Tool for AtsMonitorTool {
    type Args = AtsMonitorArgs;

    fn name(&self) -> &str {
        "monitor_ats"
    }

    fn description(&self) -> &str {
        "Check company Greenhouse job boards for internship openings. Args: {\"companies\": [\"stripe\", \"notion\"], \"ats_type\": \"greenhouse\", \"check_internships_only\": true}"
    }

    async fn call(&self, args: AtsMonitorArgs) -> Result<Value, ToolError> {
        if let Some(kind) = args.ats_type.as_deref() {
            if !kind.eq_ignore_ascii_case("greenhouse") {
                warn!("◆ Unsupported ATS type {}, using greenhouse", kind);
            }
        }

        let scan = self
            .client
            .scan(args.companies.as_deref(), args.check_internships_only)
            .await;

        Ok(json!({
            "jobs_found": scan.jobs.len(),
            "jobs": scan.jobs,
            "companies_checked": scan.checked,
            "errors": scan.errors,
        }))
    }
}

/// Polls boards and reports openings whose url is not stored yet
pub struct DetectAtsChangesTool {
    client: Arc<GreenhouseClient>,
    store: Arc<dyn ListingStore>,
}

impl DetectAtsChangesTool {
    pub fn new(client: Arc<GreenhouseClient>, store: Arc<dyn ListingStore>) -> Self {
        Self { client, store }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DetectAtsChangesArgs {
    #[serde(default)]
    companies: Option<Vec<String>>,
}

#[async_trait]
impl Tool for DetectAtsChangesTool {
    type Args = DetectAtsChangesArgs;

    fn name(&self) -> &str {
        "detect_ats_changes"
    }

    fn description(&self) -> &str {
        "Find Greenhouse internship openings that are not in the database yet. Args: {\"companies\": [\"stripe\", \"notion\"]}"
    }

    async fn call(&self, args: DetectAtsChangesArgs) -> Result<Value, ToolError> {
        let scan = self.client.scan(args.companies.as_deref(), true).await;
        let total = scan.jobs.len();

        let mut new_postings = Vec::new();
        for job in scan.jobs {
            if self.store.contains_url(&job.url).await? {
                continue;
            }
            info!("◆ New opening: {} at {}", job.title, job.company);
            new_postings.push(job);
        }

        Ok(json!({
            "total_jobs_found": total,
            "new_jobs": new_postings.len(),
            "alert_needed": !new_postings.is_empty(),
            "new_postings": new_postings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_internship() {
        assert!(is_internship("Software Engineering Intern"));
        assert!(is_internship("Summer Analyst"));
        assert!(is_internship("New Grad Backend Engineer"));
        assert!(!is_internship("Staff Engineer"));
    }

    #[test]
    fn test_parse_board_filters_and_maps() {
        let payload = json!({
            "jobs": [
                {
                    "id": 4012,
                    "title": "Software Engineer Intern",
                    "location": { "name": "San Francisco, CA" },
                    "absolute_url": "https://boards.greenhouse.io/stripe/jobs/4012",
                    "departments": [{ "name": "Engineering" }],
                    "content": "Build payments"
                },
                {
                    "id": 4013,
                    "title": "Engineering Manager",
                    "location": { "name": "Remote" },
                    "absolute_url": "https://boards.greenhouse.io/stripe/jobs/4013"
                },
                {
                    "title": "Data Co-op",
                    "location": "Dublin",
                    "absolute_url": "https://boards.greenhouse.io/stripe/jobs/9"
                }
            ]
        })
        .to_string();

        let jobs = parse_board(&payload, "stripe", true);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].ats_id, "4012");
        assert_eq!(jobs[0].location, "San Francisco, CA");
        assert_eq!(jobs[0].department, "Engineering");
        assert_eq!(jobs[0].description, "Build payments...");
        assert_eq!(jobs[0].source, "greenhouse");
        assert_eq!(jobs[1].location, "Dublin");
        assert_eq!(jobs[1].ats_id, "");
        assert_eq!(jobs[1].description, "");

        assert_eq!(parse_board(&payload, "stripe", false).len(), 3);
    }

    #[test]
    fn test_parse_board_bad_json() {
        assert!(parse_board("<html>rate limited</html>", "stripe", true).is_empty());
    }

    #[test]
    fn test_default_boards() {
        let boards = GreenhouseBoard::defaults();
        assert_eq!(boards.len(), 8);
        assert_eq!(
            boards[0].jobs_url(),
            "https://boards.greenhouse.io/stripe/jobs?format=json"
        );
    }
}
