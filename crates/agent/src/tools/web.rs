//! Web tools: web_search and web_fetch

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{Tool, ToolError};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; scout/0.1)";
const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const DEFAULT_FETCH_CHARS: usize = 20_000;

/// Search the web through the Brave Search API
pub struct WebSearchTool {
    api_key: String,
    max_results: u32,
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>, max_results: u32) -> Self {
        Self {
            api_key: api_key.unwrap_or_default(),
            max_results,
            endpoint: BRAVE_SEARCH_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &scout_config::Config) -> Self {
        Self::new(
            config.web_search_api_key(),
            config.tools.web_search.max_results,
        )
    }

    /// Point at another search endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    query: String,
    #[serde(default)]
    count: Option<u32>,
}

#[async_trait]
impl Tool for WebSearchTool {
    type Args = WebSearchArgs;

    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for internship postings or company info. Args: {\"query\": \"...\", \"count\": 5}"
    }

    async fn call(&self, args: WebSearchArgs) -> Result<Value, ToolError> {
        if self.api_key.is_empty() {
            return Err("BRAVE_API_KEY not configured".into());
        }
        let count = args.count.unwrap_or(self.max_results).clamp(1, 10);
        debug!("Web search: {}", args.query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", args.query.as_str()), ("count", &count.to_string())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Search API returned {}", status).into());
        }

        let data: Value = response.json().await?;
        let results: Vec<Value> = data
            .pointer("/web/results")
            .and_then(|r| r.as_array())
            .map(|items| {
                items
                    .iter()
                    .take(count as usize)
                    .map(|item| {
                        json!({
                            "title": item.get("title").and_then(|v| v.as_str()).unwrap_or(""),
                            "url": item.get("url").and_then(|v| v.as_str()).unwrap_or(""),
                            "snippet": item.get("description").and_then(|v| v.as_str()).unwrap_or(""),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "query": args.query,
            "count": results.len(),
            "results": results,
        }))
    }
}

/// Fetch a page and return its readable text
pub struct WebFetchTool {
    max_chars: usize,
    client: reqwest::Client,
}

impl WebFetchTool {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_CHARS)
    }
}

#[derive(Debug, Deserialize)]
pub struct WebFetchArgs {
    url: String,
    #[serde(default)]
    max_chars: Option<usize>,
}

#[async_trait]
impl Tool for WebFetchTool {
    type Args = WebFetchArgs;

    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL and return its text content. Args: {\"url\": \"https://...\"}"
    }

    async fn call(&self, args: WebFetchArgs) -> Result<Value, ToolError> {
        let max_chars = args.max_chars.unwrap_or(self.max_chars);
        debug!("Fetching URL: {}", args.url);

        let response = self
            .client
            .get(&args.url)
            .header("User-Agent", USER_AGENT)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{} returned {}", args.url, status).into());
        }

        let is_json = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = response.text().await?;

        let text = if is_json { body } else { strip_tags(&body) };
        let truncated = text.chars().count() > max_chars;
        let text: String = text.chars().take(max_chars).collect();

        Ok(json!({
            "url": args.url,
            "status": status.as_u16(),
            "truncated": truncated,
            "text": text,
        }))
    }
}

/// Drop scripts, styles and markup, then collapse whitespace
pub fn strip_tags(html: &str) -> String {
    let blocks = Regex::new(r"(?is)<script.*?</script>|<style.*?</style>")
        .map(|re| re.replace_all(html, " ").into_owned())
        .unwrap_or_else(|_| html.to_string());
    let text = Regex::new(r"<[^>]+>")
        .map(|re| re.replace_all(&blocks, " ").into_owned())
        .unwrap_or(blocks);
    let text = decode_entities(&text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
