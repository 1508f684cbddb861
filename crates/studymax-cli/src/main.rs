mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use studymax_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let config = Config::load()?;

    // The database is opened lazily, on the first command that needs it
    let mut manager = commands::connection_manager(&config, cli.db);

    let result = match cli.command {
        cli::Commands::Class(cmd) => commands::class::handle(cmd, &manager).await,
        cli::Commands::Task(cmd) => commands::task::handle(cmd, &manager, &config).await,
        cli::Commands::Document(cmd) => {
            commands::document::handle(cmd, &manager, &config).await
        }
        cli::Commands::Info => commands::info::handle(&manager, &config).await,
    };

    manager.close().await;
    result
}
