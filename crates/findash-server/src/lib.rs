//! FinDash Web Server
//!
//! Axum-based REST API backing the FinDash dashboard UI. It sits between the
//! browser and the ingestion backend: stats and transactions are passed
//! through, the what-if simulation and KPIs are computed here, and uploads
//! are validated before anything is forwarded.
//!
//! Security features:
//! - Optional API key authentication (Bearer tokens, constant-time compare)
//! - Restrictive CORS policy
//! - Input validation (pagination limits, upload type and size)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use findash_core::upload::MAX_UPLOAD_SIZE;
use findash_core::{IngestionApi, Violation};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Room for multipart boundaries and part headers around the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body limit on the upload route
///
/// Large enough that a file one byte over the limit still reaches the
/// validator and is reported as too large.
pub const MAX_UPLOAD_BODY: usize = MAX_UPLOAD_SIZE as usize + 1 + MULTIPART_OVERHEAD;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as `Authorization: Bearer <key>`
    pub api_keys: Vec<String>,
    /// Default page size for transaction listings
    pub page_size: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            page_size: 50,
        }
    }
}

/// Shared application state
///
/// Holds no per-client state. Superseded stats responses are dropped by each
/// client session, not here.
pub struct AppState {
    pub api: Arc<dyn IngestionApi>,
    pub config: ServerConfig,
}

/// Authentication middleware - validates Bearer API keys
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
/// to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Create the application router
pub fn create_router(
    api: Arc<dyn IngestionApi>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        api,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Dashboard
        .route("/stats", get(handlers::get_stats))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/forecast", get(handlers::get_forecast))
        // Transactions
        .route("/transactions", get(handlers::list_transactions))
        // Upload
        .route("/upload/check", post(handlers::check_upload))
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    api: Arc<dyn IngestionApi>,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!("⚠️  Authentication required but no API keys configured; all API requests will be rejected");
    }

    check_backend_connection(api.as_ref()).await;

    let app = create_router(api, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log ingestion backend status
async fn check_backend_connection(api: &dyn IngestionApi) {
    match api.stats().await {
        Ok(stats) => info!(
            forecast_points = stats.forecast.len(),
            "✅ Ingestion backend connected"
        ),
        Err(e) => warn!(error = %e, "⚠️  Ingestion backend not responding"),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    violation: Option<Violation>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            violation: None,
            internal: None,
        }
    }

    /// Upload turned away by the validator
    pub fn rejected(violation: Violation) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: violation.message(),
            violation: Some(violation),
            internal: None,
        }
    }

    /// Upload body exceeded the transport limit
    pub fn payload_too_large() -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            ..Self::rejected(Violation::TooLarge)
        }
    }

    /// Ingestion backend failure, reported to the client with a generic message
    pub fn backend(msg: &str, err: findash_core::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.to_string(),
            violation: None,
            internal: Some(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let mut body = serde_json::json!({
            "error": self.message
        });
        if let Some(violation) = self.violation {
            body["violation"] = serde_json::json!(violation.as_str());
        }

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            violation: None,
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
