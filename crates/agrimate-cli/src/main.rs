mod cli;
mod client;
mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use client::GatewayClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Always log to a file so streamed answers on stdout stay clean
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("agrimate")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "agrimate.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = GatewayClient::new(&cli.server)?;
    tracing::debug!(server = %cli.server, "Using gateway");

    match cli.command {
        None => commands::chat::run(&client, Default::default()).await,
        Some(Commands::Chat(args)) => commands::chat::run(&client, args).await,
        Some(Commands::Ask(args)) => commands::chat::ask(&client, args).await,
        Some(Commands::Weather { city }) => {
            commands::lookup::weather(&client, &city, cli.format).await
        }
        Some(Commands::Price { crop }) => commands::lookup::price(&client, &crop, cli.format).await,
        Some(Commands::Locate(args)) => commands::lookup::locate(args, cli.format).await,
    }
}
