//! Expense endpoints: `GET/POST /api/expenses`,
//! `PUT/DELETE /api/expenses/:id`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::persisted;
use crate::api::error::ApiError;
use crate::api::types::{validate_entry, ApiContext, ExpenseRequest};
use crate::db;
use crate::models::{Expense, NewExpense};

#[derive(Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

/// `GET /api/expenses` newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<ExpensesResponse>, ApiError> {
    let owner = ctx.core.active_user()?;
    let expenses = ctx.core.store().with_conn(|conn| db::list_expenses(conn, &owner.id))?;
    Ok(Json(ExpensesResponse { expenses }))
}

/// `POST /api/expenses`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(body): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let owner = ctx.core.active_user()?;
    let description = validate_entry(&body.description, body.amount, "Description").map_err(ApiError::BadRequest)?;
    let new_expense = NewExpense {
        owner_id: owner.id,
        description,
        amount: body.amount,
    };

    let result = ctx.core.store().with_conn(|conn| db::insert_expense(conn, &new_expense));
    let id = persisted(&ctx.core, "expenses.create", "Error saving expense", result)?;
    Ok((StatusCode::CREATED, Json(find_owned(&ctx, &id)?)))
}

/// `PUT /api/expenses/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<ExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    find_owned(&ctx, &id)?;
    let description = validate_entry(&body.description, body.amount, "Description").map_err(ApiError::BadRequest)?;

    let result = ctx
        .core
        .store()
        .with_conn(|conn| db::update_expense(conn, &id, &description, body.amount));
    persisted(&ctx.core, "expenses.update", "Error updating expense", result)?;
    Ok(Json(find_owned(&ctx, &id)?))
}

/// `DELETE /api/expenses/:id`
pub async fn delete(State(ctx): State<ApiContext>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    find_owned(&ctx, &id)?;
    let result = ctx.core.store().with_conn(|conn| db::delete_expense(conn, &id));
    persisted(&ctx.core, "expenses.delete", "Error deleting expense", result)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(ctx: &ApiContext, id: &Uuid) -> Result<Expense, ApiError> {
    let owner = ctx.core.active_user()?;
    ctx.core
        .store()
        .with_conn(|conn| db::list_expenses(conn, &owner.id))?
        .into_iter()
        .find(|e| e.id == *id)
        .ok_or_else(|| ApiError::NotFound(format!("Expense {id} not found")))
}
