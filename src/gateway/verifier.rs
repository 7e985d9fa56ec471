//! Proof verifier client.
//!
//! # Responsibilities
//! - Extract the proof token from the request headers
//! - Submit it once to the remote verifier, bounded by a timeout
//! - Map the verifier's reply onto [`VerificationOutcome`]
//!
//! # Design Decisions
//! - No retries, no backoff, no caching: one call per protected request
//! - Transport failures, timeouts and unparseable bodies are all
//!   `Unreachable`; the policy engine decides what that means
//! - A non-2xx reply can never verify, whatever its body says

use std::time::{Duration, Instant};

use axum::http::{
    header::{CONTENT_TYPE, ORIGIN},
    HeaderMap, StatusCode,
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::observability::metrics;

/// Primary proof header.
pub const X_PROOF: &str = "x-proof";
/// Alternate proof header.
pub const X_SCOPEBLIND_PROOF: &str = "x-scopeblind-proof";
/// Accepted proof headers, in precedence order.
pub const PROOF_HEADERS: [&str; 2] = [X_PROOF, X_SCOPEBLIND_PROOF];

/// Result of a single verifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified { remaining: Option<i64> },
    Rejected { reason: String },
    Unreachable { cause: String },
}

impl VerificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified { .. } => "verified",
            VerificationOutcome::Rejected { .. } => "rejected",
            VerificationOutcome::Unreachable { .. } => "unreachable",
        }
    }
}

/// Why the verifier could not produce a usable answer.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("verifier timed out after {0}ms")]
    Timeout(u64),

    #[error("verifier request failed: {0}")]
    Transport(String),

    #[error("failed to read verifier response: {0}")]
    Body(String),
}

/// Wire shape of the verifier's reply.
#[derive(Debug, Deserialize)]
struct VerifierResponse {
    #[serde(default)]
    verified: Option<bool>,
    #[serde(default)]
    remaining: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Return the first non-empty proof header value.
pub fn extract_proof(headers: &HeaderMap) -> Option<&str> {
    PROOF_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

/// Map a verifier HTTP reply onto an outcome.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> VerificationOutcome {
    let parsed: VerifierResponse = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return VerificationOutcome::Unreachable {
                cause: format!("malformed verifier response (HTTP {}): {}", status.as_u16(), e),
            }
        }
    };

    if status.is_success() && parsed.verified == Some(true) {
        let remaining = parsed.remaining.as_ref().and_then(quota_remaining);
        return VerificationOutcome::Verified { remaining };
    }

    VerificationOutcome::Rejected {
        reason: parsed
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Read the quota counter. A value that is not numeric is dropped rather than
/// failing an otherwise verified proof.
fn quota_remaining(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// HTTP client for the remote verification endpoint.
#[derive(Clone)]
pub struct VerifierClient {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl VerifierClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Verify `proof`, passing the caller's declared `Origin` through.
    pub async fn verify(&self, proof: &str, origin: Option<&str>) -> VerificationOutcome {
        let started = Instant::now();

        let outcome = match self.call(proof, origin).await {
            Ok((status, body)) => interpret_response(status, &body),
            Err(e) => VerificationOutcome::Unreachable { cause: e.to_string() },
        };

        metrics::record_verifier_call(outcome.label(), started);
        if let VerificationOutcome::Unreachable { cause } = &outcome {
            tracing::warn!(
                verifier = %self.endpoint,
                cause = %cause,
                "Verifier unreachable"
            );
        }
        outcome
    }

    async fn call(
        &self,
        proof: &str,
        origin: Option<&str>,
    ) -> Result<(StatusCode, Vec<u8>), VerifierError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(proof.to_owned());
        if let Some(origin) = origin {
            request = request.header(ORIGIN, origin);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| match self.classify(e) {
                VerifierError::Transport(msg) => VerifierError::Body(msg),
                other => other,
            })?;

        Ok((status, body.to_vec()))
    }

    fn classify(&self, e: reqwest::Error) -> VerifierError {
        if e.is_timeout() {
            VerifierError::Timeout(self.timeout.as_millis() as u64)
        } else {
            VerifierError::Transport(e.to_string())
        }
    }
}
