//! User endpoints.
//!
//! - `POST /api/users` creates a confirmed user; this is the only way
//!   users are created.
//! - `PUT /api/users/:id/business-name` renames the signed-in owner's
//!   business; any other id is reported as not found.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::persisted;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{NewUser, User};

/// `POST /api/users`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let result = ctx.core.store().with_conn(|conn| db::create_user(conn, &new_user));
    let user = persisted(&ctx.core, "users.create", "Error creating user", result)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct BusinessNameRequest {
    pub business_name: String,
}

/// `PUT /api/users/:id/business-name`
pub async fn rename_business(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<BusinessNameRequest>,
) -> Result<Json<User>, ApiError> {
    let active = ctx.core.active_user()?;
    if active.id != id {
        return Err(ApiError::NotFound(format!("User {id} not found")));
    }

    let result = ctx
        .core
        .store()
        .with_conn(|conn| db::update_business_name(conn, &id, &body.business_name));
    persisted(&ctx.core, "users.business_name", "Error saving business name", result)?;
    ctx.core.refresh_user()?;

    Ok(Json(ctx.core.active_user()?))
}
