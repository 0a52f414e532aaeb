//! Front-end asset serving for non-WebSocket requests.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::path::Path;
use tower::ServiceExt;
use tower::service_fn;
use tower_http::services::ServeDir;
use tracing::debug;

/// Serve `request` from `static_dir`.
///
/// `/` maps to `index.html`. Paths containing `..` are refused outright;
/// missing files get a plain-text 404.
pub async fn serve(static_dir: &Path, request: Request) -> Response {
    if request.uri().path().contains("..") {
        debug!(target: "feeder::http", "Refusing traversal path {}", request.uri().path());
        return (StatusCode::BAD_REQUEST, "400 Bad Request").into_response();
    }

    let service = ServeDir::new(static_dir).not_found_service(service_fn(not_found));
    match service.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn not_found(_request: Request) -> Result<Response, Infallible> {
    Ok((StatusCode::NOT_FOUND, "404 Not Found").into_response())
}
