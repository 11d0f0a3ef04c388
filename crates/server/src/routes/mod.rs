// crates/server/src/routes/mod.rs
//! API route handlers for the loadburst server.

pub mod health;
pub mod job;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/start  - Start the load job
/// - POST /api/stop   - Stop the load job
/// - GET  /api/status - Snapshot of job state
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", job::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let state = AppState::new();
        let _router = api_routes(state);
    }
}
