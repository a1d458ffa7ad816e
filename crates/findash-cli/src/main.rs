//! FinDash CLI - Personal finance dashboard
//!
//! Usage:
//!   findash dashboard                  Show KPIs from the ingestion backend
//!   findash simulate --adjustment -200 What-if projection
//!   findash upload statement.csv       Validate and upload a CSV
//!   findash serve --port 3000          Start web server

mod cli;
mod commands;


use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use findash_core::{Config, DashboardFeed, HttpIngestionClient};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let mut config = Config::load_from(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = cli.backend {
        config.backend.url = url.trim_end_matches('/').to_string();
        config.validate()?;
    }

    let client = || {
        HttpIngestionClient::from_config(&config.backend)
            .context("Failed to create ingestion backend client")
    };
    let feed = || -> Result<DashboardFeed> { Ok(DashboardFeed::new(Arc::new(client()?))) };
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Dashboard => commands::cmd_dashboard(&feed()?, today).await,
        Commands::Simulate { adjustment } => {
            commands::cmd_simulate(&feed()?, adjustment, today).await
        }
        Commands::Transactions { skip, limit } => {
            let limit = limit.unwrap_or(config.transactions.page_size);
            commands::cmd_transactions(&client()?, skip, limit).await
        }
        Commands::Check { file, media_type } => commands::cmd_check(&file, media_type.as_deref()),
        Commands::Upload { file, media_type } => {
            commands::cmd_upload(&client()?, &file, media_type.as_deref()).await
        }
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            commands::cmd_serve(&config, &host, port, no_auth, static_dir.as_deref()).await
        }
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
    }
}
