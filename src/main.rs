// Copyright 2025 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod database;
mod listing;
mod relevance;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Migrate,
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::load()?;
    match args.commands {
        Commands::Migrate => {
            database::establish_connection(&config.database_path)?;
            info!("migrations applied to {}", config.database_path.display());
        }
        Commands::Serve => api::serve(config).await?,
    }
    Ok(())
}
