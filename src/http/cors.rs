//! Cross-origin headers.
//!
//! The gateway answers preflights itself and reflects the caller's `Origin`
//! on every response it produces or relays.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Proof, X-ScopeBlind-Proof";
pub const MAX_AGE_SECS: &str = "86400";

/// Set `Access-Control-Allow-Origin` to the caller's origin, or `*`.
pub fn apply_allow_origin(headers: &mut HeaderMap, origin: Option<&str>) {
    let value = origin
        .and_then(|o| HeaderValue::from_str(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
}

/// Direct answer to an `OPTIONS` request. Nothing is forwarded.
pub fn preflight_response(origin: Option<&str>) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    apply_allow_origin(headers, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    response
}
