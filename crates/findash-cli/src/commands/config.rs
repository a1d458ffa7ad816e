//! Config command implementation

use std::path::Path;

use anyhow::Result;
use findash_core::config::default_config_path;
use findash_core::Config;

pub fn cmd_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    println!();
    println!("⚙️  FinDash Configuration");
    println!("   ─────────────────────────────────────────────────────────────");

    match (explicit, default_config_path()) {
        (Some(path), _) => println!("   Source: {}", path.display()),
        (None, Some(path)) if path.exists() => println!("   Source: {}", path.display()),
        (None, Some(path)) => {
            println!("   Source: built-in defaults");
            println!("   Override: {}", path.display());
        }
        (None, None) => println!("   Source: built-in defaults"),
    }

    if config.server.api_keys.is_empty() {
        println!("   API keys: none");
    } else {
        println!("   API keys: {} (hidden)", config.server.api_keys.len());
    }
    println!();
    print!("{}", config.to_toml_string()?);

    Ok(())
}
