use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use continuous::cli;
use continuous::config::ContinuousConfig;
use continuous::memory::types::MemoryType;
use continuous::server;

#[derive(Parser)]
#[command(name = "continuous", version, about = "Long-term memory for AI assistants, over MCP")]
struct Cli {
    /// Config file (defaults to ~/.continuous/config.toml)
    #[arg(long, global = true, env = "CONTINUOUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// stdio or http (defaults to the configured transport)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Print the session briefing
    Start {
        #[arg(long)]
        project: Option<String>,
    },
    /// Store a memory
    Remember {
        content: String,
        #[arg(short = 't', long = "type", default_value = "fact", value_parser = parse_type)]
        memory_type: MemoryType,
        #[arg(short, long)]
        importance: Option<f64>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Search memories
    Recall {
        query: String,
        #[arg(short = 'k', long)]
        limit: Option<usize>,
        #[arg(short = 't', long = "type", value_parser = parse_type)]
        memory_type: Option<MemoryType>,
        #[arg(long)]
        project: Option<String>,
        /// Rank by similarity times decayed importance
        #[arg(long)]
        weighted: bool,
    },
    /// Delete a memory by ID
    Forget { id: String },
    /// End a session: extract memories from a transcript, store a summary
    End {
        #[arg(long)]
        conversation: Option<PathBuf>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Summarise what is stored
    Reflect,
    /// Show memory statistics
    Stats,
    /// Print the identity document
    Identity,
    /// Show the link graph around a memory
    Graph {
        id: String,
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Merge near-duplicate old memories (dry run unless --apply)
    Consolidate {
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        min_age_days: Option<i64>,
        #[arg(long)]
        apply: bool,
    },
    /// Check storage, model files and configuration
    Doctor,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.continuous/models/
    Download,
}

fn parse_type(raw: &str) -> Result<MemoryType, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ContinuousConfig::load_from(path)?,
        None => ContinuousConfig::load()?,
    };

    // stderr only: stdout carries MCP JSON-RPC and the briefing.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            server::serve(config, &transport).await?;
        }
        Command::Model {
            action: ModelAction::Download,
        } => cli::model_download(&config.embedding).await?,
        Command::Doctor => cli::doctor::doctor(&config).await?,
        Command::Start { project } => {
            let engine = cli::open_engine(&config).await?;
            cli::session::start(&engine, project.as_deref()).await?;
        }
        Command::Remember {
            content,
            memory_type,
            importance,
            tags,
            project,
        } => {
            let engine = cli::open_engine(&config).await?;
            let args = cli::memories::RememberArgs {
                content: &content,
                memory_type,
                importance,
                tags: tags.as_deref(),
                project: project.as_deref(),
            };
            cli::memories::remember(&engine, args).await?;
        }
        Command::Recall {
            query,
            limit,
            memory_type,
            project,
            weighted,
        } => {
            let engine = cli::open_engine(&config).await?;
            let args = cli::memories::RecallArgs {
                query: &query,
                limit,
                memory_type,
                project: project.as_deref(),
                weighted,
            };
            cli::memories::recall(&engine, args).await?;
        }
        Command::Forget { id } => {
            let engine = cli::open_engine(&config).await?;
            cli::memories::forget(&engine, &id).await?;
        }
        Command::End {
            conversation,
            summary,
            project,
        } => {
            let engine = cli::open_engine(&config).await?;
            cli::session::end(
                &engine,
                conversation.as_deref(),
                summary.as_deref(),
                project.as_deref(),
            )
            .await?;
        }
        Command::Reflect => cli::stats::reflect(&cli::open_engine(&config).await?).await?,
        Command::Stats => cli::stats::stats(&cli::open_engine(&config).await?).await?,
        Command::Identity => cli::stats::identity(&cli::open_engine(&config).await?)?,
        Command::Graph { id, depth } => {
            let engine = cli::open_engine(&config).await?;
            cli::graph::graph(&engine, &id, depth).await?;
        }
        Command::Consolidate {
            threshold,
            min_age_days,
            apply,
        } => {
            let engine = cli::open_engine(&config).await?;
            cli::consolidate::consolidate(&engine, threshold, min_age_days, apply).await?;
        }
    }

    Ok(())
}
