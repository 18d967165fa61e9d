//! Northstar CLI - product-analytics metrics over a static event log
//!
//! Loads a flat event file into an (in-memory by default) SQLite table and
//! runs one analysis: funnel, weekly retention, or active-user counts.

mod commands;
mod render;

use clap::{Parser, Subcommand};
use commands::{ActiveUsersCommand, FunnelCommand, IngestCommand, RetentionCommand};
use northstar_database::MEMORY_DATABASE_URL;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "NORTHSTAR_LOG_LEVEL", global = true)]
    log_level: String,

    /// Database URL; the default in-memory table lasts for one invocation.
    /// Point at a file (e.g. sqlite://events.db?mode=rwc) to reuse a loaded
    /// log across commands.
    #[arg(
        long,
        default_value = MEMORY_DATABASE_URL,
        env = "NORTHSTAR_DATABASE_URL",
        global = true
    )]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an event file into the database and report loaded/skipped counts
    Ingest(IngestCommand),
    /// Sequenced milestone funnel with per-stage conversion and timing
    Funnel(FunnelCommand),
    /// Weekly cohort retention
    Retention(RetentionCommand),
    /// DAU/WAU/MAU and stickiness at an explicit instant
    ActiveUsers(ActiveUsersCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise our default filter with
    // all northstar crates at the requested level and noisy dependencies
    // capped at warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .expect("Invalid RUST_LOG environment variable")
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "northstar_cli={level},\
             northstar_core={level},\
             northstar_entities={level},\
             northstar_database={level},\
             northstar_migrations={level},\
             northstar_ingest={level},\
             northstar_funnels={level},\
             northstar_retention={level},\
             northstar_activity={level},\
             sqlx=warn,\
             sea_orm=warn",
            level = cli.log_level
        ))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let db = northstar_database::establish_connection(&cli.database_url).await?;
        match cli.command {
            Commands::Ingest(cmd) => cmd.execute(db).await,
            Commands::Funnel(cmd) => cmd.execute(db).await,
            Commands::Retention(cmd) => cmd.execute(db).await,
            Commands::ActiveUsers(cmd) => cmd.execute(db).await,
        }
    })
}
