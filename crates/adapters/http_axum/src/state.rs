//! Shared application state for axum handlers.

use std::sync::Arc;

use thermodiff_app::status::StatusRegistry;

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live view of every controller.
    pub status: Arc<StatusRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(status: Arc<StatusRegistry>) -> Self {
        Self { status }
    }
}
