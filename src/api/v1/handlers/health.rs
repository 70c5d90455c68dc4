/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認証不要 (request gate は通るが identity は見ない)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
