//! Pet-feeder hub server library - WebSocket message hub and asset server.
//!
//! Split from main.rs so integration tests can build the same router.

pub mod config;
pub mod heartbeat;
pub mod logging;
pub mod routes;
pub mod state;
pub mod static_files;
pub mod websocket;

use axum::{Router, routing::get};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the HTTP/WebSocket router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// session registry is keyed by peer address.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .fallback(routes::ws::entry)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
