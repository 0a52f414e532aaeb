//! WebSocket connection handling.
//!
//! Each connection gets a session in the registry, a writer task draining its
//! outbound queue, and a reader task that decodes frames and dispatches them.

use crate::state::AppState;
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use feeder_core::{
    CLOSE_UNSUPPORTED_DATA, ConnectionHandle, FeederError, Outbound, SessionKey, decode_frame,
};
use feeder_types::AuthKind;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Outbound frames buffered per connection. Heartbeat pings are dropped when full.
const OUTBOUND_QUEUE_SIZE: usize = 32;

/// How long the writer may keep flushing (e.g. a close frame) after the reader stops.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let (connection, mut outbound_rx) = ConnectionHandle::channel(OUTBOUND_QUEUE_SIZE);

    let key = match state.sessions.create(addr, connection.clone()) {
        Ok(key) => key,
        Err(e) => {
            error!(target: "feeder::ws", "Rejecting connection from {}: {}", addr, e);
            socket
                .send(close_message(CLOSE_UNSUPPORTED_DATA, &e.to_string()))
                .await?;
            return Ok(());
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            let closing = matches!(outbound, Outbound::Close { .. });
            let message = match outbound {
                Outbound::Text(text) => Message::Text(text.into()),
                Outbound::Ping => Message::Ping(Bytes::new()),
                Outbound::Close { code, reason } => close_message(code, &reason),
            };
            if let Err(e) = ws_tx.send(message).await {
                debug!(target: "feeder::ws", "[{}] WebSocket send failed (client likely gone): {}", key, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_rx.next().await {
            let msg = match result {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(target: "feeder::ws", "[{}] WebSocket error: {}", key, e);
                    break;
                }
            };

            let outcome = match msg {
                Message::Text(text) => {
                    handle_frame(&recv_state, key, &connection, text.as_str().as_bytes()).await
                }
                Message::Binary(bytes) => handle_frame(&recv_state, key, &connection, &bytes).await,
                Message::Ping(_) | Message::Pong(_) => {
                    trace!(target: "feeder::ws::ping", "[{}] ping/pong", key);
                    continue;
                }
                Message::Close(_) => {
                    debug!(target: "feeder::ws", "[{}] Client closed connection", key);
                    break;
                }
            };

            if let Err(e) = outcome {
                if e.is_connection_fatal() {
                    warn!(target: "feeder::ws", "[{}] Closing connection: {}", key, e);
                    let _ = connection.close(CLOSE_UNSUPPORTED_DATA, e.to_string()).await;
                } else {
                    debug!(target: "feeder::ws", "[{}] Connection ended: {}", key, e);
                }
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {}
    }

    close_session(&state, key).await;

    // Reader and registry handles are gone, so the writer stops once its queue is empty
    if !send_task.is_finished() && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }

    Ok(())
}

/// Decode one frame, dispatch it and queue the response.
async fn handle_frame(
    state: &AppState,
    key: SessionKey,
    connection: &ConnectionHandle,
    raw: &[u8],
) -> feeder_core::Result<()> {
    let frame = decode_frame(raw)?;
    info!(target: "feeder::dispatch", "[{}] REQUEST: {}", key, frame.key);

    let envelope = {
        let mut store = state.store.lock().await;
        let mut session = state
            .sessions
            .get_mut(&key)
            .ok_or(FeederError::SessionNotFound(key))?;
        state
            .router
            .dispatch(&frame.key, &mut session, &mut store, &frame.data)
    };

    let encoded = connection.send_envelope(&envelope).await?;
    info!(target: "feeder::dispatch", "[{}] RESPONSE: {}", key, encoded);
    Ok(())
}

/// Drop the session and mark its device offline if nothing else is serving it.
async fn close_session(state: &AppState, key: SessionKey) {
    let Some(session) = state.sessions.remove(&key) else {
        return;
    };
    info!(target: "feeder::session", "[{}] Client disconnected", key);

    if session.kind() != Some(AuthKind::Iot) {
        return;
    }
    if let Some(hwid) = session.bound_hwid() {
        if !state.sessions.has_device_session(hwid) && state.store.lock().await.mark_offline(hwid) {
            info!(target: "feeder::session", "Device {} is offline", hwid);
        }
    }
}

fn close_message(code: u16, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }))
}
