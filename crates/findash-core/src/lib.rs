//! FinDash Core Library
//!
//! Shared functionality for the FinDash personal finance dashboard:
//! - Trend extraction and what-if balance simulation
//! - Upload candidate validation ahead of ingestion
//! - KPI derivation (runway, trend direction)
//! - Session reducers for the interactive dashboard and upload flows
//! - Ingestion backend client with stale-response sequencing
//! - Configuration loading

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod kpi;
pub mod models;
pub mod sequence;
pub mod session;
pub mod upload;

/// Test utilities including mock ingestion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{DashboardFeed, HttpIngestionClient, IngestionApi};
pub use config::Config;
pub use error::{Error, Result};
pub use forecast::{AdjustmentRange, SimulationState, Simulator, Trend, PROJECTION_DAYS};
pub use kpi::{DashboardSummary, Kpis, TrendDirection};
pub use models::{
    Category, ForecastPoint, ForecastSeries, IngestionResult, StatsSnapshot, Transaction,
    UploadCandidate, UploadFile,
};
pub use sequence::{RequestSequencer, RequestTag};
pub use session::{DashboardEvent, DashboardState, LoadStatus};
pub use upload::{UploadEvent, UploadPhase, UploadPolicy, UploadState, Verdict, Violation};
