//! Per-request decision pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → OPTIONS? → cors.rs preflight (no upstream calls)
//!     → classifier.rs (protected method?)
//!         no  → forwarder.rs with verified=skipped
//!         yes → verifier.rs (only if a proof header is present)
//!             → policy.rs decide(mode, fallback, outcome)
//!             → telemetry.rs (exactly one event)
//!             → forwarder.rs (Forward) | error response (Reject)
//! ```
//!
//! # Design Decisions
//! - No cross-request state: the pipeline only reads immutable config
//! - At most one verifier call and one origin call, strictly in sequence
//! - Dropping the handler future (client disconnect) drops both calls

pub mod classifier;
pub mod forwarder;
pub mod policy;
pub mod telemetry;
pub mod verifier;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::{FallbackPolicy, GatewayConfig, Mode};
use crate::error::GatewayError;
use crate::http::cors;
use crate::http::request::RequestContext;
use crate::observability::metrics;

pub use classifier::MethodClassifier;
pub use forwarder::Forwarder;
pub use policy::{decide, Decision, ForwardMetadata};
pub use telemetry::{TelemetryAction, TelemetryEvent};
pub use verifier::{VerificationOutcome, VerifierClient};

/// Failure to build the pipeline from a configuration.
#[derive(Debug, Error)]
pub enum GatewayInitError {
    #[error("invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Body of `GET /_scopeblind/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub mode: Mode,
    pub origin: String,
    pub verifier: String,
}

/// The assembled pipeline. Immutable once built.
pub struct Gateway {
    mode: Mode,
    fallback: FallbackPolicy,
    classifier: MethodClassifier,
    verifier: VerifierClient,
    forwarder: Forwarder,
    origin_url: String,
    verifier_url: String,
}

impl Gateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayInitError> {
        let origin = parse_url("gateway.origin_url", &config.gateway.origin_url)?;
        let verifier_url = parse_url("gateway.verifier_url", &config.gateway.verifier_url)?;

        let verifier = VerifierClient::new(
            verifier_url,
            Duration::from_millis(config.timeouts.verifier_ms),
        )?;
        let forwarder = Forwarder::new(
            origin,
            Duration::from_secs(config.timeouts.origin_connect_secs),
            Duration::from_secs(config.timeouts.origin_response_secs),
        )?;

        Ok(Self {
            mode: config.gateway.mode,
            fallback: config.gateway.fallback,
            classifier: MethodClassifier::new(&config.gateway.protected_methods),
            verifier,
            forwarder,
            origin_url: config.gateway.origin_url.clone(),
            verifier_url: config.gateway.verifier_url.clone(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Health body. URLs are reported exactly as configured.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            ok: true,
            mode: self.mode,
            origin: self.origin_url.clone(),
            verifier: self.verifier_url.clone(),
        }
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let ctx = RequestContext::from_request(&request);

        if ctx.method == Method::OPTIONS {
            return cors::preflight_response(ctx.origin.as_deref());
        }

        if !self.classifier.requires_proof(&ctx.method) {
            metrics::record_request(ctx.method.as_str(), "skipped");
            return self
                .forward(request, &ForwardMetadata::skipped(self.mode), &ctx)
                .await;
        }

        let proof = verifier::extract_proof(request.headers()).map(str::to_owned);
        let outcome = match proof {
            Some(proof) => Some(self.verifier.verify(&proof, ctx.origin.as_deref()).await),
            None => None,
        };

        TelemetryEvent::new(&ctx, self.mode, outcome.as_ref()).emit();

        match decide(self.mode, self.fallback, outcome.as_ref()) {
            Decision::Forward(metadata) => {
                metrics::record_request(ctx.method.as_str(), metadata.verified.as_str());
                self.forward(request, &metadata, &ctx).await
            }
            Decision::Reject(error) => {
                metrics::record_request(ctx.method.as_str(), error.code());
                tracing::info!(
                    request_id = ctx.request_id.as_deref().unwrap_or("-"),
                    method = %ctx.method,
                    path = %ctx.path,
                    status = error.status().as_u16(),
                    code = error.code(),
                    "Request rejected"
                );
                reject(error, &ctx)
            }
        }
    }

    async fn forward(
        &self,
        request: Request<Body>,
        metadata: &ForwardMetadata,
        ctx: &RequestContext,
    ) -> Response {
        match self.forwarder.forward(request, metadata, ctx).await {
            Ok(response) => response,
            Err(error) => reject(error, ctx),
        }
    }
}

fn reject(error: GatewayError, ctx: &RequestContext) -> Response {
    let mut response = error.into_response();
    cors::apply_allow_origin(response.headers_mut(), ctx.origin.as_deref());
    response
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, GatewayInitError> {
    Url::parse(value).map_err(|source| GatewayInitError::InvalidUrl { field, source })
}
