use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gapscout_core::config::AppConfig;
use gapscout_engine::{build_graph, ResearchState, WorkflowEvent};
use gapscout_llm::GroqClient;
use gapscout_tools::{ToolRegistry, WebSearchTool};

#[derive(Parser)]
#[command(name = "gapscout", version, about = "Agentic market-gap research pipeline")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "gapscout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the research pipeline for a market topic
    Run {
        /// The market topic to explore
        #[arg(trailing_var_arg = true, required = true)]
        topic: Vec<String>,

        /// Emit every step event as JSON on stdout instead of a progress line
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gapscout=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run { topic, json } => run_pipeline(&config, topic.join(" "), json).await,
    }
}

async fn run_pipeline(config: &AppConfig, topic: String, json: bool) -> anyhow::Result<()> {
    let reasoner = Arc::new(GroqClient::new(config.model.clone())?);

    let mut registry = ToolRegistry::new();
    match &config.search {
        Some(search) => {
            registry.register(WebSearchTool::new(search.clone())?);
            info!("Web search tool registered");
        }
        None => warn!("No [search] config; the researcher will run without web evidence"),
    }
    let registry = Arc::new(registry);

    let graph = build_graph(reasoner, registry, config.engine.best_effort_parse)?;

    info!(topic = %topic, "Starting research run");
    let mut run = graph.run(ResearchState::new(&topic), config.engine.max_steps);

    while let Some(event) = run.next_event().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
            if let WorkflowEvent::Error { message } = &event {
                anyhow::bail!("workflow failed: {}", message);
            }
            continue;
        }
        match event {
            WorkflowEvent::Step { step, delta } => {
                if delta.is_empty() {
                    eprintln!("[step: {}]", step);
                } else {
                    eprintln!("[step: {}] {}", step, serde_json::to_string(&delta)?);
                }
            }
            WorkflowEvent::Done { final_report } => {
                println!("{}", final_report);
                return Ok(());
            }
            WorkflowEvent::Error { message } => {
                anyhow::bail!("workflow failed: {}", message);
            }
        }
    }

    Ok(())
}
