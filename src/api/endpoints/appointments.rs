//! Appointment endpoints.
//!
//! - `GET    /api/appointments` upcoming (unpaid) appointments
//! - `POST   /api/appointments` submit the form; 204 when it is incomplete
//! - `GET    /api/appointments/:id/edit-form` edit-mode prefill
//! - `PUT    /api/appointments/:id` resubmit in edit mode
//! - `PATCH  /api/appointments/:id` single-field edit
//! - `DELETE /api/appointments/:id`
//! - `POST   /api/appointments/:id/{complete,not-completed,undo,charge,undo-charge}`
//! - `GET    /api/appointments/:id/compose` messaging link

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{self, FieldEdit, ListEntry, StatusAction};
use crate::display::{self, LOCAL_INPUT_FORMAT};
use crate::form::{AppointmentForm, FormInput};
use crate::models::Appointment;

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<ListEntry>,
}

/// `GET /api/appointments`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<AppointmentsResponse>, ApiError> {
    let appointments = appointment::list_entries(&ctx.core)?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<FormInput>,
) -> Result<Response, ApiError> {
    Ok(match appointment::create_from_form(&ctx.core, input)? {
        Some(created) => (StatusCode::CREATED, Json(created)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[derive(Serialize)]
pub struct EditFormResponse {
    pub form: AppointmentForm,
    /// One hour before, rounded to five minutes, in the picker format.
    pub suggested_reminder: String,
}

/// `GET /api/appointments/:id/edit-form`
pub async fn edit_form(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditFormResponse>, ApiError> {
    let existing = appointment::find_owned(&ctx.core, &id)?;
    let tz = ctx.core.timezone();
    Ok(Json(EditFormResponse {
        form: AppointmentForm::for_edit(&existing, tz),
        suggested_reminder: display::suggest_reminder_time(&existing.scheduled_at, tz)
            .format(LOCAL_INPUT_FORMAT)
            .to_string(),
    }))
}

/// `PUT /api/appointments/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(input): Json<FormInput>,
) -> Result<Response, ApiError> {
    Ok(match appointment::edit_from_form(&ctx.core, &id, input)? {
        Some(updated) => Json(updated).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// `PATCH /api/appointments/:id`
pub async fn edit_field(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<Appointment>, ApiError> {
    Ok(Json(appointment::edit_field(&ctx.core, &id, edit)?))
}

/// `DELETE /api/appointments/:id`
pub async fn delete(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    appointment::delete(&ctx.core, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Status transitions ──────────────────────────────────────

fn transition(ctx: &ApiContext, id: Uuid, action: StatusAction) -> Result<Json<Appointment>, ApiError> {
    Ok(Json(appointment::apply_status(&ctx.core, &id, action)?))
}

pub async fn complete(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<Json<Appointment>, ApiError> {
    transition(&ctx, id, StatusAction::Complete)
}

pub async fn not_completed(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    transition(&ctx, id, StatusAction::NotCompleted)
}

pub async fn undo(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<Json<Appointment>, ApiError> {
    transition(&ctx, id, StatusAction::UndoCompletion)
}

pub async fn charge(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<Json<Appointment>, ApiError> {
    transition(&ctx, id, StatusAction::Charge)
}

pub async fn undo_charge(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    transition(&ctx, id, StatusAction::UndoCharge)
}

// ── Messaging ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct ComposeResponse {
    pub url: String,
}

/// `GET /api/appointments/:id/compose`
pub async fn compose(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ComposeResponse>, ApiError> {
    let url = appointment::compose(&ctx.core, &id)?;
    Ok(Json(ComposeResponse { url: url.into() }))
}
