//! In-app banner endpoints.
//!
//! The banner is the last step of every reminder dispatch; clients poll
//! `GET /api/notifications/active` and dismiss with
//! `POST /api/notifications/dismiss`. A dismissed appointment is not shown
//! again for the rest of the session.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Appointment;

#[derive(Serialize)]
pub struct ActiveResponse {
    pub appointment: Option<Appointment>,
}

/// `GET /api/notifications/active`
pub async fn active(State(ctx): State<ApiContext>) -> Result<Json<ActiveResponse>, ApiError> {
    let appointment = ctx.core.dispatcher()?.banner().active()?;
    Ok(Json(ActiveResponse { appointment }))
}

#[derive(Serialize)]
pub struct DismissResponse {
    pub dismissed: Option<Uuid>,
}

/// `POST /api/notifications/dismiss`
pub async fn dismiss(State(ctx): State<ApiContext>) -> Result<Json<DismissResponse>, ApiError> {
    let dismissed = ctx.core.dispatcher()?.banner().dismiss()?;
    Ok(Json(DismissResponse { dismissed }))
}
