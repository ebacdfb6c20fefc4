//! HTTP API.
//!
//! Exposes the owner's appointment book, price list, expenses, statistics
//! and the in-app reminder banner as JSON endpoints under `/api/`.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance; `start_api_server()` binds and
//! serves it.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
