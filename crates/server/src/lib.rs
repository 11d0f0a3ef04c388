// crates/server/src/lib.rs
//! loadburst server library.
//!
//! Thin axum shell over `loadburst-core`: REST controls for the single load
//! job plus a WebSocket push channel for live status.

pub mod routes;
pub mod state;
pub mod ws;

pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, start, stop, status)
/// - The /ws push channel
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(Arc::clone(&state));

    Router::new()
        .merge(api_routes(state))
        .merge(ws)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
