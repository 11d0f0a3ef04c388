// crates/server/src/routes/health.rs
//! Liveness endpoint.
//!
//! Probes hit this instead of /api/status because reading status carries the
//! expiry side effect; a liveness check must never be able to stop the job.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness response. `job_running` is read straight off the controller,
/// not via a snapshot, so it is side-effect free.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub job_running: bool,
}

/// GET /api/health - server liveness plus whether a job is active.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        job_running: state.controller.is_running(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
