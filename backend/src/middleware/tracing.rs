//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::client_ip;

/// Log every request with its outcome and latency.
///
/// Each request gets an `x-request-id` (the caller's, if supplied) that is
/// echoed on the response and attached to the log span.
pub async fn request_tracing(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = client_ip(request.headers());

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = request_id.parse() {
        request.headers_mut().insert("x-request-id", value);
    }

    let span = tracing::info_span!("request", request_id = %request_id);
    span.in_scope(|| {
        tracing::debug!(method = %method, path = %path, client_ip = ?client_ip, "Request started")
    });

    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    let _enter = span.enter();
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        tracing::error!(method = %method, path = %path, status, duration_ms, "Request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(method = %method, path = %path, status, duration_ms, "Request rejected");
    } else {
        tracing::info!(method = %method, path = %path, status, duration_ms, "Request completed");
    }

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}
