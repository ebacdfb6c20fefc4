//! Price list endpoints: `GET/POST /api/services`,
//! `PUT/DELETE /api/services/:id`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::persisted;
use crate::api::error::ApiError;
use crate::api::types::{validate_entry, ApiContext, ServiceRequest};
use crate::db;
use crate::models::{NewService, Service};

#[derive(Serialize)]
pub struct ServicesResponse {
    pub services: Vec<Service>,
}

/// `GET /api/services` sorted by name.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<ServicesResponse>, ApiError> {
    let owner = ctx.core.active_user()?;
    let services = ctx.core.store().with_conn(|conn| db::list_services(conn, &owner.id))?;
    Ok(Json(ServicesResponse { services }))
}

/// `POST /api/services`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let owner = ctx.core.active_user()?;
    let name = validate_entry(&body.name, body.price, "Service name").map_err(ApiError::BadRequest)?;
    let new_service = NewService {
        owner_id: owner.id,
        name: name.clone(),
        price: body.price,
    };

    let result = ctx.core.store().with_conn(|conn| db::insert_service(conn, &new_service));
    let id = persisted(&ctx.core, "services.create", "Error saving service", result)?;
    Ok((
        StatusCode::CREATED,
        Json(Service {
            id,
            owner_id: owner.id,
            name,
            price: body.price,
        }),
    ))
}

/// `PUT /api/services/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let mut service = find_owned(&ctx, &id)?;
    let name = validate_entry(&body.name, body.price, "Service name").map_err(ApiError::BadRequest)?;

    let result = ctx
        .core
        .store()
        .with_conn(|conn| db::update_service(conn, &id, &name, body.price));
    persisted(&ctx.core, "services.update", "Error updating service", result)?;

    service.name = name;
    service.price = body.price;
    Ok(Json(service))
}

/// `DELETE /api/services/:id`
pub async fn delete(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    find_owned(&ctx, &id)?;
    let result = ctx.core.store().with_conn(|conn| db::delete_service(conn, &id));
    persisted(&ctx.core, "services.delete", "Error deleting service", result)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(ctx: &ApiContext, id: &Uuid) -> Result<Service, ApiError> {
    let owner = ctx.core.active_user()?;
    ctx.core
        .store()
        .with_conn(|conn| db::list_services(conn, &owner.id))?
        .into_iter()
        .find(|s| s.id == *id)
        .ok_or_else(|| ApiError::NotFound(format!("Service {id} not found")))
}
