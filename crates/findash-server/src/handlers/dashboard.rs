//! Dashboard handlers: stats passthrough, summary and what-if forecast

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, AppState};
use findash_core::session::LOAD_FAILURE_MESSAGE;
use findash_core::{
    AdjustmentRange, DashboardSummary, ForecastSeries, SimulationState, Simulator, StatsSnapshot,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn fetch_stats(state: &AppState) -> Result<StatsSnapshot, AppError> {
    state
        .api
        .stats()
        .await
        .map_err(|e| AppError::backend(LOAD_FAILURE_MESSAGE, e))
}

/// GET /api/stats - Raw stats from the ingestion backend
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsSnapshot>, AppError> {
    Ok(Json(fetch_stats(&state).await?))
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    pub trend_sentence: String,
    /// Baseline forecast as reported by the backend
    pub forecast: ForecastSeries,
    pub adjustment_range: AdjustmentRange,
}

/// GET /api/dashboard - Summary cards, KPIs and baseline forecast
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = fetch_stats(&state).await?;
    let summary = DashboardSummary::from_snapshot(&stats);

    Ok(Json(DashboardResponse {
        trend_sentence: summary.trend_sentence(),
        summary,
        forecast: stats.forecast,
        adjustment_range: AdjustmentRange::default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    #[serde(default)]
    pub adjustment: f64,
}

#[derive(Serialize)]
pub struct ForecastResponse {
    /// Adjustment actually applied, after snapping and clamping
    pub adjustment: f64,
    pub label: String,
    pub simulation: SimulationState,
    pub projection: ForecastSeries,
}

/// GET /api/forecast?adjustment=N - What-if projection for a monthly adjustment
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, AppError> {
    let stats = fetch_stats(&state).await?;

    let adjustment = AdjustmentRange::default().clamp(params.adjustment);
    let mut simulator = Simulator::from_snapshot(&stats);
    simulator.set_adjustment(adjustment);

    debug!(
        requested = params.adjustment,
        adjustment,
        slope = simulator.state().effective_slope(),
        "Projecting forecast"
    );

    Ok(Json(ForecastResponse {
        adjustment,
        label: AdjustmentRange::label(adjustment),
        simulation: *simulator.state(),
        projection: simulator.project(today()),
    }))
}
