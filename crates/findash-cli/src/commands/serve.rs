//! Server command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use findash_core::config::API_KEYS_ENV;
use findash_core::{Config, HttpIngestionClient};

pub async fn cmd_serve(
    config: &Config,
    host: &str,
    port: u16,
    no_auth: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting FinDash web server...");
    println!("   Ingestion backend: {}", config.backend.url);
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    let api_keys = config.server.api_keys.clone();
    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   ❌ No API keys configured; set {} or use --no-auth", API_KEYS_ENV);
    } else {
        println!("   🔑 API keys: {} configured", api_keys.len());
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let client = HttpIngestionClient::from_config(&config.backend)
        .context("Failed to create ingestion backend client")?;

    let server_config = findash_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: vec![],
        api_keys,
        page_size: config.transactions.page_size,
    };

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    findash_server::serve_with_config(Arc::new(client), host, port, static_dir_str, server_config)
        .await?;

    Ok(())
}
