//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `config` - Effective configuration output
//! - `dashboard` - Dashboard and what-if simulation commands
//! - `serve` - Web server command
//! - `transactions` - Transaction listing
//! - `upload` - Upload check and submission commands

pub mod config;
pub mod dashboard;
pub mod serve;
pub mod transactions;
pub mod upload;

// Re-export command functions for main.rs
pub use config::*;
pub use dashboard::*;
pub use serve::*;
pub use transactions::*;
pub use upload::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Dollar amount, red when negative and green when positive
pub fn colored_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("\x1b[31m-${:.2}\x1b[0m", amount.abs()) // Red for outflow
    } else {
        format!("\x1b[32m${:.2}\x1b[0m", amount) // Green for inflow
    }
}
