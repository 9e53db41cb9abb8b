//! match_resume: score listings against a skill profile

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use scout_store::{Listing, ListingStore};

use super::{Tool, ToolError};

const DEFAULT_SKILLS: &[&str] = &[
    "python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "sql", "r",
    "react", "angular", "vue", "node", "express", "django", "flask", "fastapi",
    "machine learning", "deep learning", "tensorflow", "pytorch", "pandas", "numpy",
    "data science", "data analysis", "nosql", "mongodb", "postgresql",
    "aws", "azure", "gcp", "docker", "kubernetes", "ci/cd", "jenkins", "terraform",
    "git", "linux", "agile", "rest api", "microservices", "algorithms", "data structures",
];

const ROLE_KEYWORDS: &[&str] = &[
    "software engineer", "software developer", "swe", "backend", "frontend",
    "full stack", "fullstack", "data engineer", "data scientist", "ml engineer",
    "machine learning", "ai", "artificial intelligence", "devops", "cloud",
    "mobile", "ios", "android", "web developer", "api", "infrastructure",
];

const SKILL_PATTERNS: &[&str] = &[
    r"\b(python|java|javascript|typescript|c\+\+|c#|golang|go|rust|ruby|php|swift|kotlin|scala)\b",
    r"\b(react|angular|vue|svelte|next\.?js|node\.?js|express|django|flask|fastapi|spring|rails)\b",
    r"\b(aws|azure|gcp|google cloud|docker|kubernetes|k8s|terraform|jenkins|ci/cd)\b",
    r"\b(sql|mysql|postgresql|postgres|mongodb|redis|elasticsearch|dynamodb|firebase)\b",
    r"\b(tensorflow|pytorch|keras|scikit-learn|pandas|numpy|matplotlib|opencv)\b",
    r"\b(machine learning|deep learning|nlp|computer vision|data science|ai)\b",
    r"\b(git|github|gitlab|linux|unix|bash|shell|vim|vscode)\b",
    r"\b(rest|graphql|grpc|microservices|api|websocket)\b",
    r"\b(agile|scrum|jira|confluence|kanban)\b",
];

/// Skills and role keywords a listing is scored against
#[derive(Debug, Clone, PartialEq)]
pub struct SkillProfile {
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
}

impl Default for SkillProfile {
    fn default() -> Self {
        Self {
            skills: DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect(),
            keywords: ROLE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SkillProfile {
    /// Skills found in resume text; `None` if nothing recognizable
    pub fn from_resume_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let mut found = BTreeSet::new();

        for pattern in SKILL_PATTERNS {
            let Ok(re) = Regex::new(pattern) else {
                continue;
            };
            for cap in re.captures_iter(&lower) {
                if let Some(m) = cap.get(1) {
                    found.insert(m.as_str().to_string());
                }
            }
        }

        if found.is_empty() {
            return None;
        }

        Some(Self {
            skills: found.into_iter().collect(),
            ..Self::default()
        })
    }

    /// Read a resume file, falling back to the default profile
    pub async fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match tokio::fs::read_to_string(path).await {
            Ok(text) => match Self::from_resume_text(&text) {
                Some(profile) => {
                    info!("◆ Loaded {} skills from {:?}", profile.skills.len(), path);
                    profile
                }
                None => {
                    warn!("◆ No skills recognized in {:?}, using defaults", path);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("◆ Could not read resume {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// 0-100: skill matches weigh 70, role keywords 30
    pub fn score(&self, listing: &Listing) -> f64 {
        let text = format!(
            "{} {} {}",
            listing.title, listing.company, listing.description
        )
        .to_lowercase();

        let skill_score = if self.skills.is_empty() {
            35.0
        } else {
            let hits = self.skills.iter().filter(|s| text.contains(s.as_str())).count();
            (hits as f64 / self.skills.len() as f64 * 100.0).min(70.0)
        };

        let keyword_score = if self.keywords.is_empty() {
            0.0
        } else {
            let hits = self
                .keywords
                .iter()
                .filter(|k| text.contains(k.as_str()))
                .count();
            (hits as f64 / self.keywords.len() as f64 * 60.0).min(30.0)
        };

        let score = ((skill_score + keyword_score) * 10.0).round() / 10.0;
        score.min(100.0)
    }
}

pub struct MatchResumeTool {
    store: Arc<dyn ListingStore>,
    profile: SkillProfile,
}

impl MatchResumeTool {
    pub fn new(store: Arc<dyn ListingStore>, profile: SkillProfile) -> Self {
        Self { store, profile }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchResumeArgs {
    #[serde(default)]
    listing_ids: Option<Vec<u64>>,
}

#[async_trait]
impl Tool for MatchResumeTool {
    type Args = MatchResumeArgs;

    fn name(&self) -> &str {
        "match_resume"
    }

    fn description(&self) -> &str {
        "Score unscored internships 0-100 against the resume skills. Args: {\"listing_ids\": [1, 2]} (optional)"
    }

    async fn call(&self, args: MatchResumeArgs) -> Result<Value, ToolError> {
        let listings = self.store.unscored(args.listing_ids.as_deref()).await?;
        debug!("Scoring {} listings", listings.len());

        let scores: Vec<(u64, f64)> = listings
            .iter()
            .map(|l| (l.id, self.profile.score(l)))
            .collect();
        let scored_count = self.store.set_scores(&scores).await?;

        Ok(json!({
            "scored_count": scored_count,
            "skills_used": self.profile.skills.len(),
        }))
    }
}
