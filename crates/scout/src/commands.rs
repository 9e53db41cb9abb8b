//! Scout command implementations

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

use scout_agent::AgentEvent;
use scout_config::{self, Config};
use scout_jobs::{InMemoryJobStore, JobTracker};
use scout_store::ListingQuery;

use crate::runner::{AgentJobRunner, Services};
use crate::server::{self, AppState};

/// Write the default config and create data directories
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing Scout...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = scout_config::init().await?;

    println!("Config:  {}", scout_config::config_path().display());
    println!("Output:  {}", config.output_dir().display());
    println!("Store:   {}", config.store_path().display());

    println!("\n◆ Scout initialized");
    println!("\nNext steps:");
    println!("  1. Start Ollama with `ollama pull {}`", config.agent.model);
    println!("     or set provider.kind to \"openrouter\" and add an API key");
    println!("  2. Run a goal: scout run -g \"Find new SWE internships\"");
    println!("  3. Or the full pipeline: scout workflow");

    Ok(())
}

/// Show configuration and store status
pub async fn status_command() -> Result<()> {
    let config_path = scout_config::config_path();

    println!("◆ Scout System Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() { "[OK]" } else { "[Missing]" }
    );

    let config = Config::load().await?;
    let store_path = config.store_path();

    println!("Provider:  {:?}", config.provider.kind);
    println!("Model:     {}", config.agent.model);
    println!(
        "Access:    {}",
        if config.has_model_access() { "[Set]" } else { "[Missing]" }
    );
    println!(
        "Store:     {} {}",
        store_path.display(),
        if store_path.exists() { "[OK]" } else { "[Empty]" }
    );
    println!("Sources:   {}", config.workflow.sources.join(", "));
    println!(
        "Telegram:  {}",
        if config.notify.telegram.enabled { "[Enabled]" } else { "[Disabled]" }
    );
    println!(
        "Resume:    {}",
        config
            .resume_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "[Default skills]".to_string())
    );

    println!("\n◆ Ready");
    Ok(())
}

/// Run one goal in the foreground, printing progress
pub async fn run_command(goal: String) -> Result<()> {
    let config = Config::load().await?;
    let services = Services::from_config(config).await?;

    println!("◆ Goal: {}", goal);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::ToolDispatched { iteration, tool } => {
                    println!("  [{}] → {}", iteration, tool)
                }
                AgentEvent::ToolCompleted { success: false, tool, .. } => {
                    println!("      ✗ {} failed", tool)
                }
                _ => {}
            }
        }
    });

    let result = services.run_agent(&goal, Some(tx)).await;
    let _ = printer.await;
    let result = result?;

    println!("\n◆ {}", result["message"].as_str().unwrap_or_default());
    println!(
        "  ({} iterations, {} tool calls)",
        result["iterations"], result["tool_calls"]
    );
    Ok(())
}

/// Run the discovery workflow in the foreground
pub async fn workflow_command(workflow_type: String, sources: Vec<String>) -> Result<()> {
    let config = Config::load().await?;
    let services = Services::from_config(config).await?;
    let sources = if sources.is_empty() { None } else { Some(sources) };

    println!("◆ Running {} workflow", workflow_type);
    let result = services
        .orchestrator()
        .run_named(&workflow_type, sources, None)
        .await;

    if !result.success {
        bail!(
            "Workflow failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    println!("Discovered:  {}", result.total_discovered);
    println!("Formatted:   {} ({} dropped)", result.formatted, result.dropped);
    println!("New saved:   {}", result.new_saved);
    println!("Duplicates:  {}", result.duplicates_filtered);
    println!("Scored:      {}", result.scored_count);
    println!("Notified:    {}", if result.notified { "yes" } else { "no" });
    for (stage, error) in result.stage_errors() {
        println!("  ⚠ {:?}: {}", stage, error);
    }

    println!("\n◆ Workflow complete");
    Ok(())
}

/// Start the HTTP job API
pub async fn serve_command() -> Result<()> {
    let config = Config::load().await?;
    let addr = config.server_addr();
    let services = Arc::new(Services::from_config(config).await?);

    let tracker = JobTracker::new(
        Arc::new(InMemoryJobStore::new()),
        Arc::new(AgentJobRunner::new(services.clone())),
    );
    let state = AppState::new(tracker, Arc::new(services.orchestrator()));

    println!("◆ Scout job API on http://{}", addr);
    println!("Press Ctrl+C to stop");
    info!("◆ Serving with {} tools", services.registry()?.len());

    server::serve(&addr, state).await
}

/// Print stored listings
pub async fn listings_command(action: String, query: Option<String>, limit: usize) -> Result<()> {
    let config = Config::load().await?;
    let store = scout_store::JsonListingStore::open(config.store_path()).await?;
    let query = ListingQuery::parse(&action, query.as_deref(), Some(limit))?;

    let rows = scout_store::ListingStore::query(&store, query).await?;
    if rows.is_empty() {
        println!("No listings found");
        return Ok(());
    }

    println!("◆ {} listings", rows.len());
    for listing in rows {
        let score = if listing.is_scored() {
            format!("{:>5.1}", listing.relevance_score)
        } else {
            "    -".to_string()
        };
        println!(
            "{} #{:<4} {} @ {}{}",
            score,
            listing.id,
            listing.title,
            listing.company,
            listing
                .url
                .map(|u| format!("\n             {}", u))
                .unwrap_or_default()
        );
    }
    Ok(())
}
