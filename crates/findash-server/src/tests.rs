//! Server API tests

use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use findash_core::test_utils::{sample_stats, sample_transactions};
use findash_core::{IngestionResult, StatsSnapshot, Transaction, UploadFile};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;
use tower::ServiceExt;

/// In-process ingestion backend
#[derive(Default)]
struct StubApi {
    failing: AtomicBool,
    last_page: Mutex<Option<(i64, i64)>>,
    uploads: Mutex<Vec<UploadFile>>,
}

impl StubApi {
    fn check(&self) -> findash_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(findash_core::Error::Backend {
                status: 500,
                message: "database is locked".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionApi for StubApi {
    async fn stats(&self) -> findash_core::Result<StatsSnapshot> {
        self.check()?;
        Ok(sample_stats())
    }

    async fn transactions(&self, skip: i64, limit: i64) -> findash_core::Result<Vec<Transaction>> {
        self.check()?;
        *self.last_page.lock().unwrap() = Some((skip, limit));
        Ok(sample_transactions()
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn upload(&self, file: UploadFile) -> findash_core::Result<IngestionResult> {
        self.check()?;
        let name = file.name.clone();
        self.uploads.lock().unwrap().push(file);
        Ok(IngestionResult(serde_json::json!({ "filename": name })))
    }
}

fn open_config() -> ServerConfig {
    ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    }
}

fn setup_test_app() -> (Router, Arc<StubApi>) {
    let api = Arc::new(StubApi::default());
    (create_router(api.clone(), None, open_config()), api)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "findash-test-boundary";

fn multipart_request(name: &str, media_type: Option<&str>, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            name
        )
        .as_bytes(),
    );
    if let Some(media_type) = media_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", media_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Auth Tests ==========

#[test]
fn test_validate_api_key() {
    let keys = vec!["alpha-key".to_string(), "beta".to_string()];
    assert!(validate_api_key("alpha-key", &keys));
    assert!(validate_api_key("beta", &keys));
    assert!(!validate_api_key("alpha", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("beta", &[]));
}

#[tokio::test]
async fn test_auth_required_by_default() {
    let app = create_router(Arc::new(StubApi::default()), None, ServerConfig::default());

    let response = app.oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_bearer_key_accepted() {
    let config = ServerConfig {
        api_keys: vec!["s3cret".into()],
        ..Default::default()
    };
    let app = create_router(Arc::new(StubApi::default()), None, config);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers() {
    let (app, _) = setup_test_app();
    let response = app.oneshot(get("/api/stats")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
}

// ========== Dashboard API Tests ==========

#[tokio::test]
async fn test_get_stats_passthrough() {
    let (app, _) = setup_test_app();
    let response = app.oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["net_worth"], 2000.0);
    assert_eq!(json["forecast"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn test_get_dashboard() {
    let (app, _) = setup_test_app();
    let response = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let summary = &json["summary"];
    assert_eq!(summary["net_worth"], 2000.0);
    assert_eq!(summary["monthly_income"], 4200.0);
    assert_eq!(summary["monthly_expenses"], 3900.0);
    // |2000 / 300|
    assert!((summary["runway_months"].as_f64().unwrap() - 6.666_666).abs() < 1e-3);
    assert_eq!(summary["trend_direction"], "up");
    assert_eq!(
        json["trend_sentence"],
        "Based on your current spending habits, your balance is trending up."
    );
    assert_eq!(json["adjustment_range"]["step"], 50.0);
}

#[tokio::test]
async fn test_backend_failure_is_sanitized() {
    let (app, api) = setup_test_app();
    api.failing.store(true, Ordering::SeqCst);

    let response = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Could not load dashboard data.");
    assert!(!json.to_string().contains("database is locked"));
}

#[tokio::test]
async fn test_forecast_without_adjustment_follows_baseline() {
    let (app, _) = setup_test_app();
    let response = app.oneshot(get("/api/forecast")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["adjustment"], 0.0);
    assert_eq!(json["label"], "0");

    let projection = json["projection"].as_array().unwrap();
    assert_eq!(projection.len(), 30);
    assert_eq!(projection[0]["predicted_balance"], 2000.0);
    // (2290 - 2000) / 30 per day
    let last = projection[29]["predicted_balance"].as_f64().unwrap();
    assert!((last - (2000.0 + 29.0 * 290.0 / 30.0)).abs() < 1e-6);
}

#[tokio::test]
async fn test_forecast_adjustment_clamped() {
    let (app, _) = setup_test_app();
    let response = app
        .oneshot(get("/api/forecast?adjustment=5000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["adjustment"], 1000.0);
    assert_eq!(json["label"], "+1000");
    assert_eq!(json["simulation"]["adjustment"], 1000.0);

    // Extra spending bends the line down
    let projection = json["projection"].as_array().unwrap();
    let last = projection[29]["predicted_balance"].as_f64().unwrap();
    let expected = 2000.0 + 29.0 * (290.0 / 30.0 - 1000.0 / 30.0);
    assert!((last - expected).abs() < 1e-6);
}

#[tokio::test]
async fn test_forecast_rejects_non_numeric_adjustment() {
    let (app, _) = setup_test_app();
    let response = app
        .oneshot(get("/api/forecast?adjustment=lots"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Stats backend whose first call blocks until released
struct GatedApi {
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl IngestionApi for GatedApi {
    async fn stats(&self) -> findash_core::Result<StatsSnapshot> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        Ok(sample_stats())
    }

    async fn transactions(&self, _skip: i64, _limit: i64) -> findash_core::Result<Vec<Transaction>> {
        Ok(vec![])
    }

    async fn upload(&self, _file: UploadFile) -> findash_core::Result<IngestionResult> {
        Ok(IngestionResult(serde_json::Value::Null))
    }
}

#[tokio::test]
async fn test_overlapping_requests_all_answered() {
    let api = Arc::new(GatedApi {
        gate: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let app = create_router(api.clone(), None, open_config());

    // Dashboard panel load held in flight
    let dashboard = tokio::spawn(app.clone().oneshot(get("/api/dashboard")));
    while api.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    // Forecast panel (or another tab) loads meanwhile
    let forecast = app
        .clone()
        .oneshot(get("/api/forecast?adjustment=-200"))
        .await
        .unwrap();
    assert_eq!(forecast.status(), StatusCode::OK);

    let second_dashboard = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(second_dashboard.status(), StatusCode::OK);

    api.gate.notify_one();
    let dashboard = dashboard.await.unwrap().unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);

    let json = get_body_json(dashboard).await;
    assert_eq!(json["summary"]["net_worth"], 2000.0);
}

// ========== Transaction API Tests ==========

#[tokio::test]
async fn test_list_transactions_default_page() {
    let (app, api) = setup_test_app();
    let response = app.oneshot(get("/api/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["transactions"].as_array().unwrap().len(), 3);
    assert_eq!(json["limit"], 50);
    assert_eq!(json["transactions"][0]["category"]["type"], "income");
    assert_eq!(*api.last_page.lock().unwrap(), Some((0, 50)));
}

#[tokio::test]
async fn test_list_transactions_clamps_paging() {
    let (app, api) = setup_test_app();
    let response = app
        .clone()
        .oneshot(get("/api/transactions?skip=-5&limit=999999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        *api.last_page.lock().unwrap(),
        Some((0, MAX_PAGE_LIMIT))
    );

    let response = app
        .oneshot(get("/api/transactions?skip=1&limit=0"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["limit"], 1);
    assert_eq!(json["transactions"][0]["id"], 2);
}

// ========== Upload API Tests ==========

async fn check(app: Router, candidate: serde_json::Value) -> serde_json::Value {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload/check")
                .header("content-type", "application/json")
                .body(Body::from(candidate.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    get_body_json(response).await
}

#[tokio::test]
async fn test_check_upload_verdicts() {
    let (app, _) = setup_test_app();

    let json = check(
        app.clone(),
        serde_json::json!({
            "name": "march.csv",
            "declared_media_type": "",
            "size_bytes": 1024
        }),
    )
    .await;
    assert_eq!(json["acceptable"], true);
    assert!(json.get("violation").is_none());

    let json = check(
        app.clone(),
        serde_json::json!({
            "name": "notes.txt",
            "declared_media_type": "text/plain",
            "size_bytes": 10
        }),
    )
    .await;
    assert_eq!(json["acceptable"], false);
    assert_eq!(json["violation"], "invalid_type");
    assert_eq!(json["message"], "Invalid file type. Please upload a CSV file.");

    let json = check(
        app,
        serde_json::json!({
            "name": "big.csv",
            "declared_media_type": "text/csv",
            "size_bytes": 5 * 1024 * 1024 + 1
        }),
    )
    .await;
    assert_eq!(json["violation"], "too_large");
}

#[tokio::test]
async fn test_upload_forwards_valid_csv() {
    let (app, api) = setup_test_app();
    let response = app
        .oneshot(multipart_request(
            "march.csv",
            Some("text/csv"),
            b"date,amount\n2024-03-01,-4.5\n",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Upload successful!");
    assert_eq!(json["result"]["filename"], "march.csv");

    let uploads = api.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].media_type, "text/csv");
    assert_eq!(uploads[0].bytes, b"date,amount\n2024-03-01,-4.5\n".to_vec());
}

#[tokio::test]
async fn test_upload_accepts_csv_extension_with_generic_type() {
    let (app, api) = setup_test_app();
    let response = app
        .oneshot(multipart_request(
            "EXPORT.CSV",
            Some("application/octet-stream"),
            b"a,b\n",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(api.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_wrong_type() {
    let (app, api) = setup_test_app();
    let response = app
        .oneshot(multipart_request("photo.png", Some("image/png"), b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["violation"], "invalid_type");
    assert!(api.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let (app, api) = setup_test_app();
    let content = vec![b'x'; 5 * 1024 * 1024 + 1];
    let response = app
        .oneshot(multipart_request("big.csv", Some("text/csv"), &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["violation"], "too_large");
    assert_eq!(json["error"], "File too large. Maximum size is 5 MB.");
    assert!(api.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_exactly_at_limit_accepted() {
    let (app, api) = setup_test_app();
    let content = vec![b'x'; 5 * 1024 * 1024];
    let response = app
        .oneshot(multipart_request("edge.csv", Some("text/csv"), &content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(api.uploads.lock().unwrap()[0].bytes.len(), 5 * 1024 * 1024);
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let (app, _) = setup_test_app();
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_backend_failure() {
    let (app, api) = setup_test_app();
    api.failing.store(true, Ordering::SeqCst);

    let response = app
        .oneshot(multipart_request("march.csv", Some("text/csv"), b"a,b\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Upload failed. Please try again.");
}
