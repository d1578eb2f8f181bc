use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::app::App;

#[derive(Parser)]
#[command(name = "challenge-board")]
#[command(about = "Challenge awards and leaderboards from achievement unlocks")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.challenge-board/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the achievement service forever and keep leaderboards fresh
    Run {
        /// Also print announcements to stdout as JSON lines
        #[arg(long)]
        json_events: bool,
    },

    /// Run a single sync cycle
    Sync {
        /// Also print announcements to stdout as JSON lines
        #[arg(long)]
        json_events: bool,
    },

    /// Show a leaderboard
    Leaderboard {
        /// "monthly" or "yearly"
        scope: String,

        /// Show the last cached snapshot instead of recomputing
        #[arg(long)]
        cached: bool,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a user for syncing
    Register {
        username: String,

        /// Stop syncing this user instead
        #[arg(long)]
        deactivate: bool,
    },

    /// Grant manual points outside the challenge tiers
    Grant {
        username: String,

        /// Points to add (negative values correct earlier grants)
        #[arg(allow_hyphen_values = true)]
        points: i64,

        reason: String,

        /// Who granted the points
        #[arg(long = "by")]
        grantor: String,

        /// Month the grant counts for, as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    // Logs go to stderr so `--json-events` output stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = cli.config.as_deref();
    let open = || App::open(config_path);

    match cli.command {
        Commands::Run { json_events } => cli::run::run_command(&open()?, json_events).await?,
        Commands::Sync { json_events } => cli::sync::sync_command(&open()?, json_events).await?,
        Commands::Leaderboard { scope, cached, json } => {
            cli::leaderboard::leaderboard_command(&open()?, &scope, cached, json).await?;
        }
        Commands::Register {
            username,
            deactivate,
        } => {
            cli::register::register_command(&open()?, &username, deactivate).await?;
        }
        Commands::Grant {
            username,
            points,
            reason,
            grantor,
            month,
        } => {
            cli::grant::grant_command(&open()?, &username, points, &reason, &grantor, month).await?;
        }
        Commands::Init { force } => {
            cli::init::init_command(cli.config.clone(), force).await?;
        }
    }

    Ok(())
}
