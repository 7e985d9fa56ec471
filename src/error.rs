//! Gateway-generated error responses.
//!
//! Every rejection the gateway produces itself (as opposed to relaying the
//! origin's response) is one of these variants, rendered as
//! `{"error": <code>, "message": <text>, "details"?: <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Protected request without a proof header (enforce mode).
    #[error("proof required")]
    ProofRequired,

    /// Verifier rejected the proof (enforce mode).
    #[error("proof rejected: {0}")]
    RateLimited(String),

    /// Verifier unreachable and fallback policy is closed.
    #[error("verification unavailable")]
    VerificationUnavailable,

    /// Origin could not be reached. Independent of mode and fallback.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// JSON body of a gateway-generated error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ProofRequired => StatusCode::UNAUTHORIZED,
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::VerificationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ProofRequired => "proof_required",
            GatewayError::RateLimited(_) => "rate_limited",
            GatewayError::VerificationUnavailable => "verification_unavailable",
            GatewayError::Upstream(_) => "upstream_error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            GatewayError::ProofRequired => ErrorBody {
                error: self.code(),
                message: "This endpoint requires a proof token in the X-Proof header",
                details: None,
            },
            GatewayError::RateLimited(reason) => ErrorBody {
                error: self.code(),
                message: "Proof verification failed",
                details: Some(reason.clone()),
            },
            GatewayError::VerificationUnavailable => ErrorBody {
                error: self.code(),
                message: "Verification service unavailable",
                details: None,
            },
            // The cause stays in the logs; callers only learn the origin is down.
            GatewayError::Upstream(_) => ErrorBody {
                error: self.code(),
                message: "Failed to reach origin",
                details: None,
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
