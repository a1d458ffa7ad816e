//! Dashboard session state
//!
//! The interactive dashboard (snapshot, KPIs, what-if slider) as a plain state
//! value with a pure update function. Rendering layers feed events in and
//! read the resulting state; nothing here touches the network.
//!
//! Each load of a fresh snapshot reinitializes the simulation from that
//! snapshot's trend with no adjustment.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::forecast::{SimulationState, Trend};
use crate::kpi::{DashboardSummary, Kpis};
use crate::models::{ForecastSeries, StatsSnapshot};
use crate::sequence::RequestTag;

/// Generic message shown when stats could not be loaded
pub const LOAD_FAILURE_MESSAGE: &str = "Could not load dashboard data.";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A stats request went out under `request`
    RefreshRequested { request: RequestTag },
    SnapshotLoaded {
        request: RequestTag,
        snapshot: StatsSnapshot,
    },
    SnapshotFailed { request: RequestTag, message: String },
    /// The adjustment control moved (already clamped by the control)
    AdjustmentChanged(f64),
    /// The calendar day rolled over
    DayChanged(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub today: NaiveDate,
    pub latest_request: Option<RequestTag>,
    pub status: LoadStatus,
    pub snapshot: Option<StatsSnapshot>,
    pub summary: Option<DashboardSummary>,
    pub kpis: Option<Kpis>,
    pub simulation: Option<SimulationState>,
    pub projection: ForecastSeries,
}

impl DashboardState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            latest_request: None,
            status: LoadStatus::Idle,
            snapshot: None,
            summary: None,
            kpis: None,
            simulation: None,
            projection: Vec::new(),
        }
    }

    /// Current adjustment, 0 before any snapshot
    pub fn adjustment(&self) -> f64 {
        self.simulation.map(|s| s.adjustment).unwrap_or(0.0)
    }

    pub fn apply(self, event: DashboardEvent) -> Self {
        match event {
            DashboardEvent::RefreshRequested { request } => Self {
                latest_request: Some(request),
                status: LoadStatus::Loading,
                ..self
            },
            DashboardEvent::SnapshotLoaded { request, snapshot } => {
                if !self.is_current(request) {
                    debug!(request = request.value(), "Discarding stale stats response");
                    return self;
                }
                let simulation = SimulationState::new(Trend::from_snapshot(&snapshot));
                Self {
                    status: LoadStatus::Ready,
                    summary: Some(DashboardSummary::from_snapshot(&snapshot)),
                    kpis: Some(Kpis::derive(&snapshot)),
                    projection: simulation.project(self.today),
                    simulation: Some(simulation),
                    snapshot: Some(snapshot),
                    ..self
                }
            }
            DashboardEvent::SnapshotFailed { request, message } => {
                if !self.is_current(request) {
                    debug!(request = request.value(), "Discarding stale stats failure");
                    return self;
                }
                debug!(%message, "Stats request failed");
                Self {
                    status: LoadStatus::Failed(LOAD_FAILURE_MESSAGE.to_string()),
                    ..self
                }
            }
            DashboardEvent::AdjustmentChanged(adjustment) => match self.simulation {
                Some(simulation) => {
                    let simulation = simulation.with_adjustment(adjustment);
                    Self {
                        projection: simulation.project(self.today),
                        simulation: Some(simulation),
                        ..self
                    }
                }
                None => self,
            },
            DashboardEvent::DayChanged(today) => Self {
                projection: self
                    .simulation
                    .map(|s| s.project(today))
                    .unwrap_or_default(),
                today,
                ..self
            },
        }
    }

    fn is_current(&self, request: RequestTag) -> bool {
        self.latest_request == Some(request)
    }
}
