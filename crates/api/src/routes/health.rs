//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::sessions::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// GET /health: returns service health and the number of open sessions.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.active_sessions().await,
    })
}
