//! Owner session endpoints.
//!
//! Signing in loads the appointment book and starts the reminder engine;
//! signing out stops it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Credentials, SessionResponse};
use crate::db;

/// `POST /api/session`
pub async fn open(
    State(ctx): State<ApiContext>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let user = ctx
        .core
        .store()
        .with_conn(|conn| db::verify_credentials(conn, &credentials.email, &credentials.password))?
        .ok_or_else(|| {
            tracing::warn!("Sign-in rejected");
            ApiError::Unauthorized
        })?;

    ctx.core.open_session(user.clone())?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user,
            engine_running: ctx.core.is_engine_running(),
        }),
    ))
}

/// `GET /api/session`
pub async fn current(State(ctx): State<ApiContext>) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse {
        user: ctx.core.active_user()?,
        engine_running: ctx.core.is_engine_running(),
    }))
}

#[derive(Serialize)]
pub struct CloseResponse {
    pub closed: bool,
}

/// `DELETE /api/session`
pub async fn close(State(ctx): State<ApiContext>) -> Result<Json<CloseResponse>, ApiError> {
    let closed = ctx.core.close_session()?;
    Ok(Json(CloseResponse { closed }))
}
