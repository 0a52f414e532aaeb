//! Connection entry point: WebSocket upgrade on any path, static files otherwise.

use crate::state::AppState;
use crate::static_files;
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ConnectInfo, Request, State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// The device firmware connects to `/` and the dashboard to `/ws`, so every
/// path accepts an upgrade. Plain requests fall through to the asset server.
pub async fn entry(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request,
) -> Response {
    match upgrade {
        Ok(ws) => ws.on_upgrade(move |socket| handle_connection(socket, state, addr)),
        Err(_) => static_files::serve(&state.config.static_dir, request).await,
    }
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) {
    if let Err(e) = handle_websocket(socket, state, addr).await {
        tracing::error!(target: "feeder::ws", "WebSocket error for {}: {}", addr, e);
    }
}
