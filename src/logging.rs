//! Logging setup and HTTP request logging middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

/// Middleware logging method, path, status and latency for every request.
///
/// Apply with `.layer(axum::middleware::from_fn(http_request_logger))`
/// before `.with_state()`.
pub async fn http_request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        path = %uri.path(),
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "http request"
    );

    response
}
