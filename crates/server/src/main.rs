// crates/server/src/main.rs
//! loadburst server binary.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use loadburst_server::AppState;

/// Default port for the server.
const DEFAULT_PORT: u16 = 8080;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("LOADBURST_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,loadburst_server=info,loadburst_core=info".into()),
        )
        .init();

    let state = AppState::new();
    let app = loadburst_server::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], get_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("loadburst listening on {addr}");
    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
