//! Origin forwarder.
//!
//! # Responsibilities
//! - Rewrite the request target to the origin's scheme and authority
//! - Strip proof headers, hop-by-hop headers and spoofed metadata
//! - Inject decision metadata headers
//! - Stream the request body out and the response body back, unbuffered
//! - Add the cross-origin header to the relayed response
//!
//! # Design Decisions
//! - Origin failures are always 502, independent of mode and fallback
//! - The origin deadline covers time to response headers only; a body that
//!   is already streaming is never cut off
//! - Redirects are relayed to the caller, never followed
//! - Environment proxy variables are ignored

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderName, Request},
    response::Response,
};
use url::Url;

use crate::error::GatewayError;
use crate::gateway::policy::ForwardMetadata;
use crate::gateway::verifier::PROOF_HEADERS;
use crate::http::cors;
use crate::http::request::RequestContext;
use crate::observability::metrics;

/// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const METADATA_PREFIX: &str = "x-scopeblind-";

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.iter().any(|h| h == name)
}

/// Headers sent to the origin: the caller's headers minus proof, hop-by-hop,
/// `Host` and any caller-supplied `X-ScopeBlind-*`, plus the decision metadata.
pub fn outbound_headers(inbound: &HeaderMap, metadata: &ForwardMetadata) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 5);
    for (name, value) in inbound {
        if is_hop_by_hop(name)
            || *name == header::HOST
            || PROOF_HEADERS.contains(&name.as_str())
            || name.as_str().starts_with(METADATA_PREFIX)
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    for (name, value) in metadata.headers() {
        headers.insert(name, value);
    }
    headers
}

/// Streams requests to the configured origin.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    origin: Url,
    response_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        origin: Url,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            origin,
            response_timeout,
        })
    }

    /// Origin URL for an inbound path and query. Only the origin's scheme and
    /// authority are kept.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.origin.clone();
        url.set_path(path);
        url.set_query(query);
        url.set_fragment(None);
        url
    }

    pub async fn forward(
        &self,
        request: Request<Body>,
        metadata: &ForwardMetadata,
        ctx: &RequestContext,
    ) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();
        let url = self.target_url(parts.uri.path(), parts.uri.query());

        let mut outbound = self
            .client
            .request(parts.method.clone(), url.clone())
            .headers(outbound_headers(&parts.headers, metadata));
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = match tokio::time::timeout(self.response_timeout, outbound.send()).await {
            Ok(Ok(upstream)) => upstream,
            Ok(Err(e)) => return Err(upstream_failure(ctx, &url, e.to_string())),
            Err(_) => {
                let cause = format!(
                    "origin did not respond within {}s",
                    self.response_timeout.as_secs_f64()
                );
                return Err(upstream_failure(ctx, &url, cause));
            }
        };

        let status = upstream.status();
        let upstream_headers = upstream.headers().clone();

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        for (name, value) in &upstream_headers {
            if !is_hop_by_hop(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        cors::apply_allow_origin(headers, ctx.origin.as_deref());

        tracing::debug!(
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            status = status.as_u16(),
            verified = metadata.verified.as_str(),
            "Relayed origin response"
        );
        Ok(response)
    }
}

fn upstream_failure(ctx: &RequestContext, url: &Url, cause: String) -> GatewayError {
    tracing::error!(
        request_id = ctx.request_id.as_deref().unwrap_or("-"),
        origin = %url,
        error = %cause,
        "Upstream error"
    );
    metrics::record_upstream_error();
    GatewayError::Upstream(cause)
}
