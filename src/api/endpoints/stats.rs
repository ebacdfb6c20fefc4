//! `GET /api/stats`: earnings, expenses, balance and paid history.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{self, Statistics};

pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(appointment::statistics(&ctx.core)?))
}
