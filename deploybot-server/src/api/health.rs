//! Health Check API Handler

use axum::{Json, http::StatusCode, response::IntoResponse};

/// GET /health
/// Liveness check; requires no token
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}
