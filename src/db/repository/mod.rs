//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per collection. Every function takes a borrowed
//! `Connection`; the `Store` in `db::store` wraps these behind the
//! `AppointmentRepository` trait for the reminder engine.

mod app_log;
mod appointment;
mod expense;
mod service;
mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::DatabaseError;

// Re-export all public items from sub-modules
pub use app_log::*;
pub use appointment::*;
pub use expense::*;
pub use service::*;
pub use user::*;

/// Timestamps are stored as RFC 3339 UTC with millisecond precision so
/// that text ordering matches time ordering.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp '{raw}': {e}")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Turn a SQLite constraint failure into a readable violation, keep
/// every other error as is.
pub(crate) fn constraint_or(err: rusqlite::Error, message: String) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(message)
        }
        _ => DatabaseError::Sqlite(err),
    }
}
