//! Request ID propagation.
//!
//! Every request runs inside a `request` span carrying its ID, so log lines
//! emitted by handlers and repositories can be correlated.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepts a caller-supplied ID only when it is short and printable.
fn incoming_request_id(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .filter(|s| s.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
}

/// Reuses `X-Request-ID` when present, otherwise generates a UUID v4, and
/// echoes it on the response.
pub async fn trace_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = incoming_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let start = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), header_value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(id: &str) -> Request<Body> {
        Request::builder()
            .uri("/api/v1/events")
            .header(REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_incoming_request_id_accepted() {
        assert_eq!(
            incoming_request_id(&request_with("req-123_abc.xyz")),
            Some("req-123_abc.xyz".to_string())
        );
    }

    #[test]
    fn test_incoming_request_id_rejects_blank_and_long() {
        assert_eq!(incoming_request_id(&request_with("   ")), None);
        assert_eq!(incoming_request_id(&request_with(&"a".repeat(200))), None);
        assert_eq!(incoming_request_id(&request_with("has space")), None);
    }

    #[test]
    fn test_missing_header() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(incoming_request_id(&req), None);
    }
}
