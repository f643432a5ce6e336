//! Status snapshot handler.

use axum::extract::State;
use axum::Json;

use dogwatch_models::SystemStatus;

use crate::state::AppState;

/// Current status snapshot.
///
/// Always serves a complete snapshot: the publisher swaps snapshots
/// wholesale, and a failed detection cycle leaves the last-known-good one
/// in place.
pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.status.current().await)
}
