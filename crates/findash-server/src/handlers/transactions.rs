//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use findash_core::Transaction;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: i64,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transactions: Vec<Transaction>,
    pub limit: i64,
    pub skip: i64,
}

/// GET /api/transactions - List recent transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<TransactionResponse>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params
        .limit
        .unwrap_or(state.config.page_size)
        .clamp(1, MAX_PAGE_LIMIT);
    let skip = params.skip.max(0);

    let transactions = state
        .api
        .transactions(skip, limit)
        .await
        .map_err(|e| AppError::backend("Could not load transactions.", e))?;

    Ok(Json(TransactionResponse {
        transactions,
        limit,
        skip,
    }))
}
