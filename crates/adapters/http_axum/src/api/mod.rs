//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod controllers;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/controllers", get(controllers::list))
        .route("/controllers/{device}", get(controllers::get))
}
