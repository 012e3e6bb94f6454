//! Keiba-DB
//!
//! Builds a SQLite race database from db.netkeiba.com pages.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keiba_db::cli::{self, Cli, Commands};
use keiba_db::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keiba_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;
    tracing::debug!("Data directory: {}", config.path.data_dir.display());

    match cli.command {
        Commands::Collect { years } => cli::run_collect(&config, years).await,
        Commands::Dump { kind } => cli::run_dump(&config, kind).await,
        Commands::Import { kind, force } => cli::run_import(&config, kind, force).await,
        Commands::Sync => cli::run_sync(&config).await,
        Commands::Parse { file, kind } => cli::run_parse(&file, kind),
    }
}
