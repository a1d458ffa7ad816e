//! Secondary dashboard metrics derived from a stats snapshot

use serde::{Deserialize, Serialize};

use crate::models::StatsSnapshot;

/// Direction the balance is trending
///
/// A zero slope classifies as `Down`; there is no flat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runway and trend direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Months until net worth is exhausted at the current burn rate
    pub runway_months: f64,
    pub trend_direction: TrendDirection,
}

impl Kpis {
    pub fn derive(stats: &StatsSnapshot) -> Self {
        Self {
            runway_months: runway_months(stats.net_worth, stats.burn_rate),
            trend_direction: TrendDirection::from_slope(stats.trend_slope),
        }
    }
}

/// `|net_worth / burn_rate|`, or 0 when there is no burn
pub fn runway_months(net_worth: f64, burn_rate: f64) -> f64 {
    if burn_rate != 0.0 {
        (net_worth / burn_rate).abs()
    } else {
        0.0
    }
}

/// Headline figures shown on the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub net_worth: f64,
    pub monthly_income: f64,
    /// Always non-negative, whatever sign the backend uses for expenses
    pub monthly_expenses: f64,
    pub runway_months: f64,
    pub trend_direction: TrendDirection,
}

impl DashboardSummary {
    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        let kpis = Kpis::derive(stats);
        Self {
            net_worth: stats.net_worth,
            monthly_income: stats.total_income,
            monthly_expenses: stats.total_expenses.abs(),
            runway_months: kpis.runway_months,
            trend_direction: kpis.trend_direction,
        }
    }

    pub fn trend_sentence(&self) -> String {
        format!(
            "Based on your current spending habits, your balance is trending {}.",
            self.trend_direction
        )
    }
}
