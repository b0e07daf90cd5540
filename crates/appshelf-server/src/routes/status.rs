//! Store status endpoint.

use axum::{extract::State, routing::get, Json, Router};

use super::AppState;
use crate::store::StoreStatus;

/// Creates the status router.
pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(get_status)).with_state(state)
}

/// GET /api/v1/status
///
/// Reports which backend is active and the most recent store error.
async fn get_status(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(state.gallery.status().await)
}
