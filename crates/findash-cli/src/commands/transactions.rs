//! Transaction command implementations

use anyhow::{Context, Result};
use findash_core::IngestionApi;

use super::{colored_amount, truncate};

pub async fn cmd_transactions(api: &dyn IngestionApi, skip: i64, limit: i64) -> Result<()> {
    let transactions = api
        .transactions(skip.max(0), limit.max(1))
        .await
        .context("Failed to fetch transactions")?;

    if transactions.is_empty() {
        println!("No transactions found. Upload a statement with:");
        println!("  findash upload statement.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        println!(
            "   {} │ {:>10} │ {:<40} │ {}",
            tx.date,
            colored_amount(tx.amount),
            truncate(&tx.description, 40),
            tx.category_name()
        );
    }

    Ok(())
}
