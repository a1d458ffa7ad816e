//! FinDash configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. Explicit path (e.g. `findash --config ./findash.toml`)
//! 2. Override in data dir (~/.local/share/findash/config/findash.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Environment variables are applied last:
//! - `FINDASH_BACKEND_URL`: ingestion backend base URL
//! - `FINDASH_API_KEYS`: comma-separated API keys for the dashboard server

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/findash.toml");

pub const BACKEND_URL_ENV: &str = "FINDASH_BACKEND_URL";
pub const API_KEYS_ENV: &str = "FINDASH_API_KEYS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub server: ServerSettings,
    pub transactions: TransactionSettings,
}

/// Where the ingestion backend lives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Never written out when printing the effective config
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSettings {
    pub page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:8000".to_string(),
                timeout_secs: 30,
            },
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                api_keys: vec![],
            },
            transactions: TransactionSettings { page_size: 50 },
        }
    }
}

impl Config {
    /// Load from the default locations and apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load with an optional explicit path (which must exist when given)
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config");
                fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "Loading config override");
                    fs::read_to_string(&path)?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML, filling anything missing from built-in defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(backend) = raw.backend {
            if let Some(url) = backend.url {
                config.backend.url = url;
            }
            if let Some(timeout) = backend.timeout_secs {
                config.backend.timeout_secs = timeout;
            }
        }

        if let Some(server) = raw.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(keys) = server.api_keys {
                config.server.api_keys = keys;
            }
        }

        if let Some(page_size) = raw.transactions.and_then(|t| t.page_size) {
            config.transactions.page_size = page_size;
        }

        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|s| !s.trim().is_empty()) {
            self.backend.url = url.trim().to_string();
        }
        if let Some(keys) = lookup(API_KEYS_ENV) {
            self.server.api_keys = parse_api_keys(&keys);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.backend.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend.url must start with http:// or https://, got {}",
                url
            )));
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config("backend.timeout_secs must be positive".into()));
        }
        if self.transactions.page_size <= 0 {
            return Err(Error::Config(
                "transactions.page_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML (API keys omitted)
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("findash").join("config").join("findash.toml"))
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_api_keys(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    backend: Option<RawBackend>,
    server: Option<RawServer>,
    transactions: Option<RawTransactions>,
}

#[derive(Debug, Deserialize)]
struct RawBackend {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    api_keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawTransactions {
    page_size: Option<i64>,
}
