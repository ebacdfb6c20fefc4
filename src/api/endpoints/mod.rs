//! API endpoint handlers, one module per screen.
//!
//! Handlers reuse the core operations; raw price-list and expense CRUD
//! talks to the store directly.

pub mod appointments;
pub mod expenses;
pub mod health;
pub mod notifications;
pub mod services;
pub mod session;
pub mod stats;
pub mod users;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::DatabaseError;

/// Surface a store write result; failures are also recorded in the
/// application log.
pub(crate) fn persisted<T>(
    core: &CoreState,
    context: &str,
    message: &str,
    result: Result<T, DatabaseError>,
) -> Result<T, ApiError> {
    result.map_err(|e| {
        core.report_error(context, message, &e);
        ApiError::from(e)
    })
}
