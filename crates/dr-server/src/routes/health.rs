//! Liveness and greeting endpoints.

use axum::Json;
use serde::Serialize;

/// GET /health
pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
}

/// GET /api/hello
///
/// Fixed greeting kept for existing front ends that call it on load.
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Test with FastAPI",
    })
}
