//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinDash - See where your balance is heading
#[derive(Parser)]
#[command(name = "findash")]
#[command(about = "Personal finance dashboard with what-if forecasting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ingestion backend URL (overrides config and FINDASH_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show net worth, income, expenses, runway and trend
    Dashboard,

    /// Project the balance over the next 30 days with a spending adjustment
    Simulate {
        /// Monthly spending change: positive spends more, negative saves
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        adjustment: f64,
    },

    /// List recent transactions
    Transactions {
        /// Number of transactions to skip
        #[arg(long, default_value = "0")]
        skip: i64,

        /// Maximum number to show (defaults to transactions.page_size)
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Check whether a file would be accepted for upload
    Check {
        /// File to check
        file: PathBuf,

        /// Media type to report (guessed from the extension if omitted)
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Upload a CSV statement to the ingestion backend
    Upload {
        /// CSV file to upload
        file: PathBuf,

        /// Media type to report (guessed from the extension if omitted)
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,

        /// Directory with the built dashboard UI
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}
