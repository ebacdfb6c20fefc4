//! API router.
//!
//! Returns a composable `Router` with every endpoint nested under `/api/`.
//! Layers (outermost first): request tracing, then CORS for browser
//! clients.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Users and session
        .route("/users", post(endpoints::users::create))
        .route("/users/:id/business-name", put(endpoints::users::rename_business))
        .route(
            "/session",
            get(endpoints::session::current)
                .post(endpoints::session::open)
                .delete(endpoints::session::close),
        )
        // Appointments
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            put(endpoints::appointments::update)
                .patch(endpoints::appointments::edit_field)
                .delete(endpoints::appointments::delete),
        )
        .route("/appointments/:id/edit-form", get(endpoints::appointments::edit_form))
        .route("/appointments/:id/compose", get(endpoints::appointments::compose))
        .route("/appointments/:id/complete", post(endpoints::appointments::complete))
        .route("/appointments/:id/not-completed", post(endpoints::appointments::not_completed))
        .route("/appointments/:id/undo", post(endpoints::appointments::undo))
        .route("/appointments/:id/charge", post(endpoints::appointments::charge))
        .route("/appointments/:id/undo-charge", post(endpoints::appointments::undo_charge))
        // Price list and expenses
        .route(
            "/services",
            get(endpoints::services::list).post(endpoints::services::create),
        )
        .route(
            "/services/:id",
            put(endpoints::services::update).delete(endpoints::services::delete),
        )
        .route(
            "/expenses",
            get(endpoints::expenses::list).post(endpoints::expenses::create),
        )
        .route(
            "/expenses/:id",
            put(endpoints::expenses::update).delete(endpoints::expenses::delete),
        )
        .route("/stats", get(endpoints::stats::summary))
        // In-app banner
        .route("/notifications/active", get(endpoints::notifications::active))
        .route("/notifications/dismiss", post(endpoints::notifications::dismiss))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
