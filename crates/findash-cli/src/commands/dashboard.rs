//! Dashboard command implementations (dashboard, simulate)

use anyhow::{bail, Result};
use chrono::NaiveDate;
use findash_core::{AdjustmentRange, DashboardEvent, DashboardFeed, DashboardState, LoadStatus};

use super::colored_amount;

/// Fetch a snapshot and run it through the dashboard reducer
pub async fn load_dashboard(feed: &DashboardFeed, today: NaiveDate) -> Result<DashboardState> {
    let (request, result) = feed.fetch_stats().await;
    let state = DashboardState::new(today).apply(DashboardEvent::RefreshRequested { request });

    let state = match result {
        Ok(snapshot) => state.apply(DashboardEvent::SnapshotLoaded { request, snapshot }),
        Err(e) => state.apply(DashboardEvent::SnapshotFailed {
            request,
            message: e.to_string(),
        }),
    };

    if let LoadStatus::Failed(message) = &state.status {
        bail!("{}", message);
    }
    Ok(state)
}

pub async fn cmd_dashboard(feed: &DashboardFeed, today: NaiveDate) -> Result<()> {
    let state = load_dashboard(feed, today).await?;
    let Some(summary) = state.summary.as_ref() else {
        bail!("No dashboard data available");
    };

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│          💰 FinDash Dashboard           │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Net Worth:         {}", colored_amount(summary.net_worth));
    println!("  Monthly Income:    ${:.2}", summary.monthly_income);
    println!("  Monthly Expenses:  ${:.2}", summary.monthly_expenses);
    println!();
    println!("  ⏳ Runway:  {:.1} months", summary.runway_months);
    let arrow = match summary.trend_direction {
        findash_core::TrendDirection::Up => "📈",
        findash_core::TrendDirection::Down => "📉",
    };
    println!("  {} Trend:   {}", arrow, summary.trend_direction);
    println!();
    println!("  {}", summary.trend_sentence());

    if let Some(last) = state.projection.last() {
        println!(
            "  30-day outlook: {} by {}",
            colored_amount(last.predicted_balance),
            last.date
        );
    }
    println!();
    println!("  Run 'findash simulate --adjustment -200' to try a what-if.");

    Ok(())
}

pub async fn cmd_simulate(feed: &DashboardFeed, adjustment: f64, today: NaiveDate) -> Result<()> {
    let range = AdjustmentRange::default();
    let applied = range.clamp(adjustment);

    let baseline = load_dashboard(feed, today).await?;
    let adjusted = baseline
        .clone()
        .apply(DashboardEvent::AdjustmentChanged(applied));

    if applied != adjustment {
        println!(
            "   Adjustment {} adjusted to {} (range {} to {}, step {})",
            adjustment, applied, range.min, range.max, range.step
        );
    }

    println!();
    println!(
        "🔮 What-if: {} $/month spending",
        AdjustmentRange::label(applied)
    );
    if let Some(sim) = adjusted.simulation {
        println!(
            "   Daily trend: {:+.2} → {:+.2}",
            sim.baseline_slope,
            sim.effective_slope()
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:<10} │ {:>14} │ {:>14}", "Date", "Baseline", "Adjusted");

    for (base, point) in baseline.projection.iter().zip(&adjusted.projection) {
        println!(
            "   {} │ {:>14.2} │ {:>14.2}",
            point.date, base.predicted_balance, point.predicted_balance
        );
    }

    if let (Some(base), Some(point)) = (baseline.projection.last(), adjusted.projection.last()) {
        println!();
        println!(
            "   Difference after 30 days: {}",
            colored_amount(point.predicted_balance - base.predicted_balance)
        );
    }

    Ok(())
}
