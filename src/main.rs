use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::watch;

use trawl::commands::{self, App};
use trawl::config::Config;
use trawl::ingest::{self, scheduler};
use trawl::storage::Database;

/// Get the config directory path (~/.config/trawl/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("trawl"))
}

#[derive(Parser, Debug)]
#[command(name = "trawl", version, about = "Poll RSS sources on a schedule and collect new entries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new user and log in as them
    Register { name: String },
    /// Log in as an existing user
    Login { name: String },
    /// List all users
    Users,
    /// Delete all users, sources, and entries
    Reset,
    /// Register a feed source and follow it
    Add { name: String, url: String },
    /// List all registered sources
    Sources,
    /// Follow an already-registered source
    Follow { url: String },
    /// Stop following a source
    Unfollow { url: String },
    /// List the sources you follow
    Following,
    /// Poll sources forever at the given interval (e.g. "30s", "5m", "1h")
    Poll { interval: String },
    /// Show recent entries from sources you follow
    Browse {
        #[arg(default_value_t = 2)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("failed to create config directory")?;
    }

    let config_path = config_dir.join("config.toml");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let db_path = config
        .database
        .clone()
        .unwrap_or_else(|| config_dir.join("trawl.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    let mut app = App {
        db,
        config,
        config_path,
    };

    match cli.command {
        Command::Register { name } => commands::register(&mut app, &name).await,
        Command::Login { name } => commands::login(&mut app, &name).await,
        Command::Users => commands::list_users(&app).await,
        Command::Reset => commands::reset(&app).await,
        Command::Add { name, url } => commands::add_source(&app, &name, &url).await,
        Command::Sources => commands::list_sources(&app).await,
        Command::Follow { url } => commands::follow(&app, &url).await,
        Command::Unfollow { url } => commands::unfollow(&app, &url).await,
        Command::Following => commands::following(&app).await,
        Command::Poll { interval } => poll(app, &interval).await,
        Command::Browse { limit } => commands::browse(&app, limit).await,
    }
}

/// Run the polling loop until Ctrl-C.
async fn poll(app: App, interval: &str) -> Result<()> {
    // Interval problems are the one error surfaced before the loop starts.
    let interval = scheduler::parse_interval(interval)?;
    let client = ingest::build_client().context("failed to build HTTP client")?;

    println!("Collecting feeds every {}s. Press Ctrl-C to stop.", interval.as_secs());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler::run(app.db, client, interval, shutdown_rx).await;
    Ok(())
}
