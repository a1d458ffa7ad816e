//! Trend extraction and what-if balance simulation
//!
//! The ingestion backend ships a baseline 30-day forecast. From it we take a
//! straight-line trend (daily slope, starting at current net worth) and let
//! the user bend it with a hypothetical change in monthly spending.
//!
//! ## Sign convention
//!
//! The adjustment is a change in **spending**. Spending more per month lowers
//! the daily rate of balance growth, so the daily delta is
//! `-adjustment / 30`.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{ForecastPoint, ForecastSeries, StatsSnapshot};

/// Number of daily points in every projection
pub const PROJECTION_DAYS: usize = 30;

/// Days per month used to turn a monthly adjustment into a daily delta
const DAYS_PER_MONTH: f64 = 30.0;

/// Linear trend derived from a baseline forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Daily rate of change of the balance
    pub slope: f64,
    /// Starting balance (current net worth)
    pub intercept: f64,
}

impl Trend {
    /// Derive a trend from a baseline forecast and the current net worth
    ///
    /// The slope spans first to last point divided by the series length.
    /// An empty series yields a flat trend; the intercept is always `net_worth`.
    pub fn extract(forecast: &[ForecastPoint], net_worth: f64) -> Self {
        let slope = match (forecast.first(), forecast.last()) {
            (Some(first), Some(last)) => {
                (last.predicted_balance - first.predicted_balance) / forecast.len() as f64
            }
            _ => 0.0,
        };

        Self {
            slope,
            intercept: net_worth,
        }
    }

    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        Self::extract(&stats.forecast, stats.net_worth)
    }
}

/// State behind the what-if simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub baseline_slope: f64,
    pub intercept: f64,
    /// Hypothetical change in monthly spending (positive = spend more)
    pub adjustment: f64,
}

impl SimulationState {
    pub fn new(trend: Trend) -> Self {
        Self {
            baseline_slope: trend.slope,
            intercept: trend.intercept,
            adjustment: 0.0,
        }
    }

    /// Same baseline, different adjustment
    pub fn with_adjustment(self, adjustment: f64) -> Self {
        Self { adjustment, ..self }
    }

    /// Change in daily slope caused by the adjustment
    pub fn daily_delta(&self) -> f64 {
        -self.adjustment / DAYS_PER_MONTH
    }

    pub fn effective_slope(&self) -> f64 {
        self.baseline_slope + self.daily_delta()
    }

    /// Project `PROJECTION_DAYS` daily balances starting at `today` (inclusive)
    pub fn project(&self, today: NaiveDate) -> ForecastSeries {
        let slope = self.effective_slope();
        (0..PROJECTION_DAYS)
            .map(|i| ForecastPoint {
                date: today + Duration::days(i as i64),
                predicted_balance: self.intercept + slope * i as f64,
            })
            .collect()
    }
}

/// What-if simulator over a fixed baseline trend
///
/// Trusts its input: the adjustment control clamps before calling
/// [`Simulator::set_adjustment`].
#[derive(Debug, Clone)]
pub struct Simulator {
    state: SimulationState,
}

impl Simulator {
    pub fn new(trend: Trend) -> Self {
        Self {
            state: SimulationState::new(trend),
        }
    }

    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        Self::new(Trend::from_snapshot(stats))
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn set_adjustment(&mut self, adjustment: f64) {
        self.state = self.state.with_adjustment(adjustment);
    }

    pub fn project(&self, today: NaiveDate) -> ForecastSeries {
        self.state.project(today)
    }
}

/// Bounds and granularity of the spending adjustment control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for AdjustmentRange {
    fn default() -> Self {
        Self {
            min: -1000.0,
            max: 1000.0,
            step: 50.0,
        }
    }
}

impl AdjustmentRange {
    /// Snap a raw value to the nearest step and clamp it into range
    ///
    /// Non-finite input falls back to no adjustment.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0_f64.clamp(self.min, self.max);
        }
        let snapped = self.min + ((value - self.min) / self.step).round() * self.step;
        snapped.clamp(self.min, self.max)
    }

    /// Whether `value` is a position the control can actually take
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max && ((value - self.min) % self.step).abs() < 1e-9
    }

    /// Signed display label (`+250`, `-500`, `0`)
    pub fn label(value: f64) -> String {
        if value > 0.0 {
            format!("+{}", value)
        } else {
            format!("{}", value)
        }
    }
}
