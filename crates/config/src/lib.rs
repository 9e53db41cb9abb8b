//! Configuration management for scout
//!
//! Loads and saves the JSON config file, with environment fallbacks for secrets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, ensure_dir, expand_home};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Agent loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_max_iterations() -> u32 {
    15
}

fn default_tool_timeout_secs() -> u64 {
    60
}

/// Which model backend to talk to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenRouter,
}

/// Ollama endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base")]
    pub api_base: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            api_base: default_ollama_base(),
        }
    }
}

fn default_ollama_base() -> String {
    "http://localhost:11434".to_string()
}

/// OpenRouter / OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            ollama: OllamaConfig::default(),
            openrouter: OpenRouterConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Orchestration workflow defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            limit: default_limit(),
        }
    }
}

fn default_sources() -> Vec<String> {
    vec![
        "SimplifyJobs".to_string(),
        "Pitt-CSC".to_string(),
        "SpeedyApply".to_string(),
    ]
}

fn default_limit() -> usize {
    500
}

/// Telegram delivery
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
}

/// Notification delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default = "default_outbox")]
    pub outbox: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            outbox: default_outbox(),
        }
    }
}

fn default_outbox() -> String {
    "~/.scout/output/alerts.log".to_string()
}

/// Web search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    5
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: default_max_results(),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            web_search: WebSearchConfig::default(),
            resume_path: None,
        }
    }
}

fn default_output_dir() -> String {
    "~/.scout/output".to_string()
}

/// Listing store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "~/.scout/listings.json".to_string()
}

/// HTTP job API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// OpenRouter key from config, else `OPENROUTER_API_KEY`
    pub fn openrouter_api_key(&self) -> Option<String> {
        non_empty(&self.provider.openrouter.api_key).or_else(|| env_non_empty("OPENROUTER_API_KEY"))
    }

    /// Brave search key from config, else `BRAVE_API_KEY`
    pub fn web_search_api_key(&self) -> Option<String> {
        non_empty(&self.tools.web_search.api_key).or_else(|| env_non_empty("BRAVE_API_KEY"))
    }

    /// Telegram bot token from config, else `TELEGRAM_BOT_TOKEN`
    pub fn telegram_token(&self) -> Option<String> {
        non_empty(&self.notify.telegram.token).or_else(|| env_non_empty("TELEGRAM_BOT_TOKEN"))
    }

    /// Telegram chat id from config, else `TELEGRAM_CHAT_ID`
    pub fn telegram_chat_id(&self) -> Option<String> {
        non_empty(&self.notify.telegram.chat_id).or_else(|| env_non_empty("TELEGRAM_CHAT_ID"))
    }

    /// Whether the configured backend has what it needs to answer requests
    pub fn has_model_access(&self) -> bool {
        match self.provider.kind {
            ProviderKind::Ollama => !self.provider.ollama.api_base.is_empty(),
            ProviderKind::OpenRouter => self.openrouter_api_key().is_some(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_home(&self.tools.output_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        expand_home(&self.store.path)
    }

    pub fn outbox_path(&self) -> PathBuf {
        expand_home(&self.notify.outbox)
    }

    pub fn resume_path(&self) -> Option<PathBuf> {
        self.tools.resume_path.as_deref().map(expand_home)
    }

    /// Socket address string for the HTTP server
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Write the default config (if absent) and create data directories
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ Config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ Config written to {:?}", config_path);
    }

    let config = Config::load().await?;
    ensure_dir(&config.output_dir()).await?;
    info!("◆ Output directory ready at {:?}", config.output_dir());

    Ok(config)
}
