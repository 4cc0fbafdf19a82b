//! aiagent CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `run`     — Answer one query with the ReAct agent
//! - `plan`    — Break a goal into search queries
//! - `tools`   — List the tools the agent can call
//! - `config`  — Show, validate or locate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "aiagent",
    about = "aiagent — ReAct agent runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.aiagent/config.toml
    #[arg(short, long, global = true, env = "AIAGENT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single query
    Run {
        /// The question to answer
        #[arg(short, long)]
        query: String,

        /// Print tool activity as it happens
        #[arg(short, long)]
        stream: bool,

        /// Override the maximum number of tool rounds
        #[arg(long)]
        step_limit: Option<u32>,
    },

    /// Break a goal into search queries
    Plan {
        /// The goal to plan for
        #[arg(short, long)]
        query: String,
    },

    /// List available tools as the model sees them
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Check the configuration and report problems
    Validate,
    /// Print the config file location
    Path,
    /// Print a config file with every default filled in
    Default,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::gateway::run(config_path, port).await?,
        Commands::Run {
            query,
            stream,
            step_limit,
        } => commands::agent::run(config_path, &query, stream, step_limit).await?,
        Commands::Plan { query } => commands::plan::run(config_path, &query).await?,
        Commands::Tools => commands::tools::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Default => commands::config_cmd::default().await?,
        },
    }

    Ok(())
}
