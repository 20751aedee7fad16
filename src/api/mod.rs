//! HTTP API handlers and routing.

pub mod error;
mod extract;
mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::runtime::handle::SkidLogHandle;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    handle: SkidLogHandle,
}

impl AppState {
    /// Wraps a running skidlog handle.
    pub fn new(handle: SkidLogHandle) -> Self {
        Self { handle }
    }

    /// The runtime serving this API.
    pub fn handle(&self) -> &SkidLogHandle {
        &self.handle
    }
}

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
