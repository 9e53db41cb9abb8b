//! Wiring: provider, store, notifiers and tools built from config

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use scout_agent::tools::{
    AtsMonitorTool, DetectAtsChangesTool, DetectChangesTool, FileWriteTool, GithubMonitorTool,
    GreenhouseClient, MatchResumeTool, QueryListingsTool, SaveListingsTool, SendNotificationTool,
    SkillProfile, WebFetchTool, WebSearchTool,
};
use scout_agent::{
    AgentEvent, AgentLoop, AgentSettings, OrchestrateTool, Orchestrator, RunOutcome, SharedTool,
    ToolRegistry,
};
use scout_channels::{FanoutNotifier, Notifier, OutboxNotifier, TelegramNotifier};
use scout_config::{Config, ProviderKind};
use scout_jobs::{JobRunner, RunError};
use scout_provider::{OllamaProvider, OpenRouterProvider, Provider};
use scout_store::{JsonListingStore, ListingStore};

/// Build the model backend selected in config
pub fn build_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let timeout = Duration::from_secs(config.provider.request_timeout_secs);
    let model = Some(config.agent.model.clone()).filter(|m| !m.is_empty());

    let provider: Arc<dyn Provider> = match config.provider.kind {
        ProviderKind::Ollama => Arc::new(
            OllamaProvider::new(
                config.provider.ollama.api_base.clone(),
                model.unwrap_or_default(),
            )
            .with_timeout(timeout),
        ),
        ProviderKind::OpenRouter => {
            let api_key = config
                .openrouter_api_key()
                .context("No OpenRouter API key configured. Set provider.openrouter.api_key in ~/.scout/config.json or OPENROUTER_API_KEY")?;
            Arc::new(
                OpenRouterProvider::new(
                    api_key,
                    config.provider.openrouter.api_base.clone(),
                    model,
                )
                .with_timeout(timeout),
            )
        }
    };
    Ok(provider)
}

/// Outbox always, Telegram when enabled and fully configured
pub fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    let mut targets: Vec<Arc<dyn Notifier>> =
        vec![Arc::new(OutboxNotifier::new(config.outbox_path()))];

    if config.notify.telegram.enabled {
        match (config.telegram_token(), config.telegram_chat_id()) {
            (Some(token), Some(chat_id)) => match TelegramNotifier::new(&token, &chat_id) {
                Ok(telegram) => targets.push(Arc::new(telegram)),
                Err(e) => warn!("◆ Telegram disabled: {}", e),
            },
            _ => warn!("◆ Telegram enabled but token or chat id is missing"),
        }
    }

    Arc::new(FanoutNotifier::new(targets))
}

/// Everything a run needs, shared across jobs
pub struct Services {
    pub config: Config,
    pub provider: Arc<dyn Provider>,
    pub store: Arc<dyn ListingStore>,
    pub notifier: Arc<dyn Notifier>,
    pub profile: SkillProfile,
}

impl Services {
    pub async fn from_config(config: Config) -> Result<Self> {
        let provider = build_provider(&config)?;
        let store_path = config.store_path();
        let store = JsonListingStore::open(&store_path)
            .await
            .with_context(|| format!("Failed to open listing store at {}", store_path.display()))?;
        let notifier = build_notifier(&config);
        let profile = SkillProfile::load(config.resume_path().as_deref()).await;

        Ok(Self {
            config,
            provider,
            store: Arc::new(store),
            notifier,
            profile,
        })
    }

    /// Discovery, persistence, scoring and notification tools
    fn stage_tools(&self) -> [SharedTool; 4] {
        [
            Arc::new(GithubMonitorTool::default()),
            Arc::new(SaveListingsTool::new(self.store.clone())),
            Arc::new(MatchResumeTool::new(
                self.store.clone(),
                self.profile.clone(),
            )),
            Arc::new(SendNotificationTool::new(self.notifier.clone())),
        ]
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let [discovery, persistence, scoring, notification] = self.stage_tools();
        Orchestrator::new(discovery, persistence, scoring, notification)
            .with_sources(self.config.workflow.sources.clone())
            .with_limit(self.config.workflow.limit)
    }

    /// The full tool set offered to the model
    pub fn registry(&self) -> Result<ToolRegistry> {
        let [discovery, persistence, scoring, notification] = self.stage_tools();
        let greenhouse = Arc::new(GreenhouseClient::default());
        let tools: Vec<SharedTool> = vec![
            discovery,
            Arc::new(DetectChangesTool::new(self.store.clone())),
            Arc::new(AtsMonitorTool::new(greenhouse.clone())),
            Arc::new(DetectAtsChangesTool::new(greenhouse, self.store.clone())),
            persistence,
            Arc::new(QueryListingsTool::new(self.store.clone())),
            scoring,
            notification,
            Arc::new(FileWriteTool::new(self.config.output_dir())),
            Arc::new(WebSearchTool::from_config(&self.config)),
            Arc::new(WebFetchTool::default()),
            Arc::new(OrchestrateTool::new(Arc::new(self.orchestrator()))),
        ];

        let registry = ToolRegistry::from_tools(tools)?
            .with_timeout(Duration::from_secs(self.config.agent.tool_timeout_secs));
        Ok(registry)
    }

    /// Run one goal through the agent loop
    pub async fn run_agent(
        &self,
        goal: &str,
        events: Option<UnboundedSender<AgentEvent>>,
    ) -> Result<Value> {
        let mut agent = AgentLoop::new(self.provider.clone(), self.registry()?)
            .with_settings(AgentSettings::from(&self.config.agent));
        if let Some(tx) = events {
            agent = agent.with_events(tx);
        }

        let run = agent.run(goal).await?;
        let status = match run.outcome {
            RunOutcome::Completed { .. } => "completed",
            RunOutcome::Exhausted => "exhausted",
        };

        Ok(json!({
            "status": status,
            "message": run.message(),
            "iterations": run.iterations,
            "tool_calls": run.tool_calls,
        }))
    }
}

/// Runs submitted goals through the agent loop
pub struct AgentJobRunner {
    services: Arc<Services>,
}

impl AgentJobRunner {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl JobRunner for AgentJobRunner {
    async fn run(&self, job_id: &str, goal: &str) -> std::result::Result<Value, RunError> {
        info!("◆ Agent job {} working on: {}", job_id, goal);
        self.services
            .run_agent(goal, None)
            .await
            .map_err(|e| RunError::from(e.to_string()))
    }
}

/// Runs the orchestration workflow; the job goal is the workflow type
pub struct WorkflowJobRunner {
    orchestrator: Arc<Orchestrator>,
    sources: Option<Vec<String>>,
}

impl WorkflowJobRunner {
    pub fn new(orchestrator: Arc<Orchestrator>, sources: Option<Vec<String>>) -> Self {
        Self {
            orchestrator,
            sources,
        }
    }
}

#[async_trait]
impl JobRunner for WorkflowJobRunner {
    async fn run(&self, job_id: &str, goal: &str) -> std::result::Result<Value, RunError> {
        let result = self
            .orchestrator
            .run_named(goal, self.sources.clone(), Some(job_id.to_string()))
            .await;

        if result.success {
            Ok(serde_json::to_value(&result)?)
        } else {
            Err(result
                .error
                .unwrap_or_else(|| "workflow failed".to_string())
                .into())
        }
    }
}
