//! Test utilities for findash-core
//!
//! This module provides testing infrastructure including a mock ingestion
//! backend that can be used for development and integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::models::{Category, ForecastPoint, StatsSnapshot, Transaction, UploadFile};

/// Stats used by the mock backend: 2000 net worth trending +10/day
pub fn sample_stats() -> StatsSnapshot {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    StatsSnapshot {
        net_worth: 2000.0,
        total_income: 4200.0,
        total_expenses: -3900.0,
        burn_rate: 300.0,
        forecast: (0..30)
            .map(|i| ForecastPoint {
                date: start + Duration::days(i),
                predicted_balance: 2000.0 + 10.0 * i as f64,
            })
            .collect(),
        trend_slope: 10.0,
    }
}

/// Transactions used by the mock backend, most recent first
pub fn sample_transactions() -> Vec<Transaction> {
    let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    vec![
        Transaction {
            id: 1,
            date: date(15),
            description: "PAYROLL ACME CORP".to_string(),
            amount: 4200.0,
            category: Some(Category {
                name: "Salary".to_string(),
                kind: "income".to_string(),
            }),
        },
        Transaction {
            id: 2,
            date: date(12),
            description: "TRADER JOE'S #123".to_string(),
            amount: -86.42,
            category: Some(Category {
                name: "Groceries".to_string(),
                kind: "expense".to_string(),
            }),
        },
        Transaction {
            id: 3,
            date: date(10),
            description: "ATM WITHDRAWAL".to_string(),
            amount: -60.0,
            category: None,
        },
    ]
}

#[derive(Default)]
struct MockState {
    fail_status: Mutex<Option<u16>>,
    last_page: Mutex<Option<(i64, i64)>>,
    uploads: Mutex<Vec<UploadFile>>,
}

impl MockState {
    fn failure(&self) -> Option<Response> {
        let status = (*self.fail_status.lock().unwrap())?;
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some((status, "mock failure").into_response())
    }
}

/// Mock ingestion backend for testing and development
pub struct MockIngestionServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockIngestionServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/stats", get(handle_stats))
            .route("/transactions", get(handle_transactions))
            .route("/upload", post(handle_upload))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make every endpoint answer with `status`
    pub fn fail_with(&self, status: u16) {
        *self.state.fail_status.lock().unwrap() = Some(status);
    }

    /// `(skip, limit)` of the last transactions request
    pub fn last_page(&self) -> Option<(i64, i64)> {
        *self.state.last_page.lock().unwrap()
    }

    /// Files received on `/upload`
    pub fn uploads(&self) -> Vec<UploadFile> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockIngestionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_stats(State(state): State<Arc<MockState>>) -> Response {
    if let Some(failure) = state.failure() {
        return failure;
    }
    Json(sample_stats()).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

async fn handle_transactions(
    State(state): State<Arc<MockState>>,
    Query(page): Query<PageQuery>,
) -> Response {
    if let Some(failure) = state.failure() {
        return failure;
    }
    *state.last_page.lock().unwrap() = Some((page.skip, page.limit));

    let txs: Vec<Transaction> = sample_transactions()
        .into_iter()
        .skip(page.skip.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect();
    Json(txs).into_response()
}

async fn handle_upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    if let Some(failure) = state.failure() {
        return failure;
    }

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("").to_string();
        let media_type = field.content_type().unwrap_or("").to_string();
        let Ok(bytes) = field.bytes().await else {
            return (StatusCode::BAD_REQUEST, "unreadable file").into_response();
        };

        let rows = bytes.iter().filter(|b| **b == b'\n').count();
        state
            .uploads
            .lock()
            .unwrap()
            .push(UploadFile::new(name.clone(), media_type, bytes.to_vec()));

        return Json(serde_json::json!({
            "filename": name,
            "rows": rows,
        }))
        .into_response();
    }

    (StatusCode::UNPROCESSABLE_ENTITY, "missing file field").into_response()
}
