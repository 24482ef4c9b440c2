//! Genesis CLI, the main entry point.
//!
//! Commands:
//! - `onboard`   Write a default config, example personas and topics
//! - `debate`    Run a turn-based debate on a random topic
//! - `world`     Run the autonomous forum until Ctrl-C
//! - `view`      Read the forum as threaded discussions
//! - `personas`  List and validate persona files
//! - `status`    Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod remarks;

#[derive(Parser)]
#[command(
    name = "genesis",
    about = "Genesis: a forum simulator populated by LLM personas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.genesis/config.toml
    #[arg(short, long, global = true, env = "GENESIS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config, example personas and a topics file
    Onboard,

    /// Run a strict round-robin debate between personas
    Debate {
        /// Comma-separated persona names (defaults to [debate].participants)
        #[arg(short, long, value_delimiter = ',')]
        participants: Vec<String>,

        /// Replies per participant
        #[arg(short, long)]
        turns: Option<u32>,

        /// Topics file (defaults to [world].topics_file)
        #[arg(long)]
        topics: Option<PathBuf>,

        /// Print style and tactic choices as they happen
        #[arg(long)]
        show_decisions: bool,
    },

    /// Run the autonomous world
    World {
        /// round_robin, random_tick or hybrid
        #[arg(short, long)]
        strategy: Option<String>,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Comma-separated persona names (defaults to every persona file)
        #[arg(short, long, value_delimiter = ',')]
        participants: Vec<String>,

        /// Seed the RNG for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print moderator remarks for every decision
        #[arg(long)]
        show_decisions: bool,
    },

    /// Read the forum
    View {
        /// Only show this subreddit
        #[arg(short, long)]
        subreddit: Option<String>,

        /// Re-render periodically until Ctrl-C
        #[arg(short, long)]
        follow: bool,

        /// Seconds between renders when following
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },

    /// List and validate persona files
    Personas,

    /// Show the effective configuration
    Status {
        /// Also check that the configured provider is reachable
        #[arg(long)]
        ping: bool,
    },
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
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Debate {
            participants,
            turns,
            topics,
            show_decisions,
        } => {
            let args = commands::debate::DebateArgs {
                participants,
                turns,
                topics,
                show_decisions,
            };
            commands::debate::run(config_path, args).await?
        }
        Commands::World {
            strategy,
            max_ticks,
            participants,
            seed,
            show_decisions,
        } => {
            let args = commands::world::WorldArgs {
                strategy,
                max_ticks,
                participants,
                seed,
                show_decisions,
            };
            commands::world::run(config_path, args).await?
        }
        Commands::View {
            subreddit,
            follow,
            interval,
        } => commands::view::run(config_path, subreddit, follow, interval).await?,
        Commands::Personas => commands::personas::run(config_path).await?,
        Commands::Status { ping } => commands::status::run(config_path, ping).await?,
    }

    Ok(())
}
