use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use pricedb_core::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Run each request inside an `http.request` span and log its completion.
///
/// The generated request id is echoed back in `x-request-id`.
pub async fn request_span(req: Request<Body>, next: Next) -> Response {
    let request_id = RequestId::new();
    let span = tracing::info_span!(
        "http.request",
        %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    tracing::info!(
        parent: &span,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
