//! Scout - autonomous internship discovery agent

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;
mod runner;
mod server;

use commands::{
    init_command, listings_command, run_command, serve_command, status_command,
    workflow_command,
};

/// Scout - find, save and rank internships with a tool-calling agent
#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "◆ An autonomous internship-discovery agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and create data directories
    Init,
    /// Show system status
    Status,
    /// Run the agent loop on a goal
    Run {
        /// Goal for the agent
        #[arg(short, long)]
        goal: String,
    },
    /// Run the discovery workflow
    Workflow {
        /// Workflow type: full or discover
        #[arg(short = 't', long = "type", default_value = "full")]
        workflow_type: String,
        /// Source repos to check (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<String>,
    },
    /// Start the HTTP job API
    Serve,
    /// List saved internships
    Listings {
        /// recent, search or unapplied
        #[arg(short, long, default_value = "recent")]
        action: String,
        /// Text to search for
        #[arg(short, long)]
        query: Option<String>,
        /// Maximum rows
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Status => status_command().await,
        Commands::Run { goal } => run_command(goal).await,
        Commands::Workflow {
            workflow_type,
            sources,
        } => workflow_command(workflow_type, sources).await,
        Commands::Serve => serve_command().await,
        Commands::Listings {
            action,
            query,
            limit,
        } => listings_command(action, query, limit).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
