//! Service info endpoint.

use axum::{response::IntoResponse, Json};

use super::super::SERVICE_NAME;

const USAGE: &str = "Use POST /preview with { url, raw_html? } to get a preview.";

/// `GET /`: identify the service and how to use it.
pub async fn service_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "message": USAGE,
    }))
}
