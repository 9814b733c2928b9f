use axum::{Json, response::IntoResponse};
use serde_json::json;

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "formsync: create Google Forms from form schemas" }))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
