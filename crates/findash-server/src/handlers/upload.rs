//! Upload handlers
//!
//! Validation runs at both call sites: `/upload/check` when the user picks a
//! file, and `/upload` against the bytes that actually arrived.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{AppError, AppState};
use findash_core::models::guess_media_type;
use findash_core::upload::{UPLOAD_FAILURE_MESSAGE, UPLOAD_SUCCESS_MESSAGE};
use findash_core::{
    IngestionResult, UploadCandidate, UploadFile, UploadPolicy, Verdict, Violation,
};

#[derive(Serialize)]
pub struct CheckResponse {
    pub acceptable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    /// User-facing message when rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/upload/check - Validate a candidate before any bytes are sent
pub async fn check_upload(Json(candidate): Json<UploadCandidate>) -> Json<CheckResponse> {
    let verdict = UploadPolicy::new().validate(&candidate);
    let violation = verdict.violation();
    Json(CheckResponse {
        acceptable: verdict.is_acceptable(),
        violation,
        message: violation.map(|v| v.message()),
    })
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub result: IngestionResult,
}

/// POST /api/upload - Validate and forward a CSV to the ingestion backend
///
/// Expects multipart form with:
/// - file: CSV file (required, max 5MB)
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<UploadFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("").to_string();
        let media_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| guess_media_type(&name).to_string());
        let bytes = field.bytes().await.map_err(multipart_error)?;

        file = Some(UploadFile::new(name, media_type, bytes.to_vec()));
    }

    let file = file.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    if let Verdict::Rejected(violation) = UploadPolicy::new().validate(&file.candidate()) {
        warn!(name = %file.name, %violation, "Rejected upload");
        return Err(AppError::rejected(violation));
    }

    let name = file.name.clone();
    let size = file.bytes.len();
    let result = state
        .api
        .upload(file)
        .await
        .map_err(|e| AppError::backend(UPLOAD_FAILURE_MESSAGE, e))?;

    info!(name = %name, size, "Forwarded upload to ingestion backend");

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        result,
    }))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large()
    } else {
        AppError::bad_request(&format!("Failed to read form field: {}", err))
    }
}
