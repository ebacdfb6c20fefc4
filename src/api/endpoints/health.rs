//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_active: bool,
    pub engine_running: bool,
    pub version: &'static str,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        session_active: ctx.core.has_session(),
        engine_running: ctx.core.is_engine_running(),
        version: crate::config::APP_VERSION,
    })
}
