// crates/server/src/ws.rs
//! WebSocket push channel: one status snapshot per second per subscriber.
//!
//! Each connection gets its own publisher loop in the core. Transport
//! failures and client disconnects end the connection quietly; nothing here
//! reaches the controller or other subscribers.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use loadburst_core::{publish_status, PUBLISH_PERIOD};

use crate::state::AppState;

/// GET /ws — upgrade and stream status snapshots until disconnect.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel(8);
    let publisher = tokio::spawn(publish_status(
        Arc::clone(&state.controller),
        tx,
        PUBLISH_PERIOD,
    ));

    loop {
        tokio::select! {
            view = rx.recv() => {
                // Publisher never drops its sender first, but guard anyway.
                let Some(view) = view else { break };
                let json = serde_json::to_string(&view).unwrap_or_default();
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by axum; other frames are ignored.
                    _ => {}
                }
            }
        }
    }

    // Dropping rx ends the publisher loop on its next send; abort shortcuts
    // the wait for the current period.
    publisher.abort();
    debug!("status subscriber disconnected");
}
