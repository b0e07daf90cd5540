//! API routes for the AppShelf server.

pub mod artifacts;
pub mod session;
pub mod status;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::gallery::Gallery;
use crate::session::SessionRegistry;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
    /// Per-client sessions, addressed by the session header.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(gallery: Arc<Gallery>, sessions: Arc<SessionRegistry>) -> Self {
        Self { gallery, sessions }
    }
}

/// Creates the main API router with all routes mounted.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes(state))
}

/// Creates the v1 API routes.
fn api_v1_routes(state: AppState) -> Router {
    Router::new()
        .nest("/artifacts", artifacts::router(state.clone()))
        .nest("/session", session::router(state.clone()))
        .nest("/status", status::router(state))
}

async fn health() -> &'static str {
    "ok"
}
