//! Live status endpoint.

use axum::extract::State;
use axum::Json;
use gmc_models::StatusSnapshot;

use crate::state::AppState;

/// Latest gesture, FPS, latency and collaborator error.
pub async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.status())
}
