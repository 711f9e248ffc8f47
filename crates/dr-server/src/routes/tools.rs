//! Converter availability endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use dr_convert::ToolInfo;

use crate::context::AppContext;

#[derive(Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
    pub active_jobs: usize,
    pub max_concurrent_jobs: usize,
}

/// GET /api/tools
///
/// Serves the availability detected at startup; no process is started here.
pub async fn tools(State(ctx): State<AppContext>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: vec![ctx.converter_tool.as_ref().clone()],
        active_jobs: ctx.runner.active_jobs(),
        max_concurrent_jobs: ctx.runner.max_concurrent(),
    })
}
