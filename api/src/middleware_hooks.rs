use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info};

pub const VERSION_HEADER: &str = "x-warden-version";

/// Request processing middleware hook
///
/// Logs each request with its status and how long the handler took.
/// Credentials never appear here: only the method and path are logged.
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    debug!(%method, %path, "Request received");

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request processed"
    );

    response
}

/// Response processing middleware hook
///
/// Stamps every response with the service version.
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response
        .headers_mut()
        .insert(
            HeaderName::from_static(VERSION_HEADER),
            HeaderValue::from_static(crate::VERSION),
        );

    response
}
