//! Request inspection.
//!
//! # Responsibilities
//! - Capture the per-request facts the pipeline needs (method, path,
//!   client identifier, declared origin, request ID)
//! - Resolve the client identifier from edge headers or the peer address
//!
//! # Design Decisions
//! - Request ID is assigned by the `SetRequestIdLayer` before the handler
//!   runs, so it is always present in practice
//! - Header values that are not valid UTF-8 are treated as absent

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header::ORIGIN, HeaderMap, HeaderName, Method, Request},
};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Per-request facts shared by the verifier, forwarder and telemetry.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub client: String,
    pub origin: Option<String>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn from_request(request: &Request<Body>) -> Self {
        let headers = request.headers();
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            client: client_identifier(headers, peer),
            origin: header_str(headers, ORIGIN.as_str()).map(str::to_string),
            request_id: header_str(headers, X_REQUEST_ID.as_str()).map(str::to_string),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `CF-Connecting-IP`, else the first `X-Forwarded-For` hop, else the peer
/// address, else `"unknown"`.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = header_str(headers, CF_CONNECTING_IP) {
        return ip.to_string();
    }
    if let Some(first) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_identifier_precedence() {
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, Some(peer)), "10.0.0.5");
        assert_eq!(client_identifier(&headers, None), "unknown");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("198.51.100.7, 10.0.0.1"));
        assert_eq!(client_identifier(&headers, Some(peer)), "198.51.100.7");

        headers.insert(CF_CONNECTING_IP, HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_identifier(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn test_context_from_request() {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/v1/orders?draft=true")
            .header(ORIGIN, "https://app.example.com")
            .header(X_REQUEST_ID, "req-42")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("192.0.2.1:5000".parse::<SocketAddr>().unwrap()));

        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.path, "/v1/orders");
        assert_eq!(ctx.client, "192.0.2.1");
        assert_eq!(ctx.origin.as_deref(), Some("https://app.example.com"));
        assert_eq!(ctx.request_id.as_deref(), Some("req-42"));
    }
}
