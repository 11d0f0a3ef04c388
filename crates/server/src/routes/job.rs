// crates/server/src/routes/job.rs
//! Job control endpoints.
//!
//! - POST /api/start — start the load job (plain text "started"/"already_running")
//! - POST /api/stop — stop it (plain text "stopped")
//! - GET /api/status — JSON status snapshot
//!
//! Range clamping is a transport-layer concern: the controller receives only
//! values inside the guardrails below.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use loadburst_core::StatusView;

use crate::state::AppState;

const DEFAULT_MEM_MIB: i64 = 1900;
const DEFAULT_CPU_WORKERS: i64 = 2;
const DEFAULT_SECONDS: i64 = 120;

/// Request body for POST /api/start. Every field is optional; absent fields
/// take the defaults above. Values are accepted raw (including zero and
/// negatives) and clamped before they reach the controller.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default = "default_mem_mib")]
    pub mem_mib: i64,
    #[serde(default = "default_cpu_workers")]
    pub cpu_workers: i64,
    #[serde(default = "default_seconds")]
    pub seconds: i64,
}

fn default_mem_mib() -> i64 {
    DEFAULT_MEM_MIB
}

fn default_cpu_workers() -> i64 {
    DEFAULT_CPU_WORKERS
}

fn default_seconds() -> i64 {
    DEFAULT_SECONDS
}

/// Guardrails applied before the controller sees the request.
pub fn clamp_mem_mib(v: i64) -> u64 {
    v.clamp(64, 3000) as u64
}

pub fn clamp_cpu_workers(v: i64) -> u64 {
    v.clamp(1, 32) as u64
}

pub fn clamp_seconds(v: i64) -> u64 {
    v.clamp(5, 3600) as u64
}

/// POST /api/start — start the job with clamped parameters.
async fn start(State(state): State<Arc<AppState>>, Json(req): Json<StartRequest>) -> &'static str {
    let outcome = state.controller.start(
        clamp_mem_mib(req.mem_mib),
        clamp_cpu_workers(req.cpu_workers),
        clamp_seconds(req.seconds),
    );
    outcome.as_str()
}

/// POST /api/stop — stop the job. Always succeeds (stop is idempotent).
async fn stop(State(state): State<Arc<AppState>>) -> &'static str {
    state.controller.stop("stop requested");
    "stopped"
}

/// GET /api/status — current snapshot. Reading status past the deadline
/// stops the job as a side effect; see the controller docs.
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusView> {
    Json(state.controller.snapshot())
}

/// Build the job control router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/status", get(status))
}
