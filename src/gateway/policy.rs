//! Policy engine: (mode, fallback, verification outcome) → decision.
//!
//! | proof | outcome     | observe                          | enforce                                  |
//! |-------|-------------|----------------------------------|------------------------------------------|
//! | no    | -           | forward missing / would-block    | 401 `proof_required`                     |
//! | yes   | Rejected    | forward failed / would-block     | 429 `rate_limited` + details             |
//! | yes   | Unreachable | forward error / fallback-allow   | closed: 503, open: forward fallback-allow|
//! | yes   | Verified    | forward true + remaining         | forward true + remaining                 |
//!
//! Observe mode never rejects. The fallback policy only matters for
//! enforce + unreachable.

use axum::http::{HeaderName, HeaderValue};

use crate::config::{FallbackPolicy, Mode};
use crate::error::GatewayError;
use crate::gateway::verifier::VerificationOutcome;

pub const X_SCOPEBLIND_MODE: HeaderName = HeaderName::from_static("x-scopeblind-mode");
pub const X_SCOPEBLIND_VERIFIED: HeaderName = HeaderName::from_static("x-scopeblind-verified");
pub const X_SCOPEBLIND_ACTION: HeaderName = HeaderName::from_static("x-scopeblind-action");
pub const X_SCOPEBLIND_ERROR: HeaderName = HeaderName::from_static("x-scopeblind-error");
pub const X_SCOPEBLIND_REMAINING: HeaderName = HeaderName::from_static("x-scopeblind-remaining");

/// Value of `X-ScopeBlind-Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedStatus {
    Skipped,
    Missing,
    Failed,
    Error,
    True,
}

impl VerifiedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifiedStatus::Skipped => "skipped",
            VerifiedStatus::Missing => "missing",
            VerifiedStatus::Failed => "failed",
            VerifiedStatus::Error => "error",
            VerifiedStatus::True => "true",
        }
    }
}

/// Value of `X-ScopeBlind-Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    WouldBlock,
    FallbackAllow,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::WouldBlock => "would-block",
            DecisionAction::FallbackAllow => "fallback-allow",
        }
    }
}

/// Decision metadata attached to a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardMetadata {
    pub mode: Mode,
    pub verified: VerifiedStatus,
    pub action: Option<DecisionAction>,
    pub error: Option<String>,
    pub remaining: Option<i64>,
}

impl ForwardMetadata {
    fn new(mode: Mode, verified: VerifiedStatus) -> Self {
        Self {
            mode,
            verified,
            action: None,
            error: None,
            remaining: None,
        }
    }

    /// Metadata for requests whose method is not protected.
    pub fn skipped(mode: Mode) -> Self {
        Self::new(mode, VerifiedStatus::Skipped)
    }

    fn with_action(mut self, action: DecisionAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Render as origin request headers, leaving out empty values and values
    /// that are not representable as a header.
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (X_SCOPEBLIND_MODE, HeaderValue::from_static(self.mode.as_str())),
            (X_SCOPEBLIND_VERIFIED, HeaderValue::from_static(self.verified.as_str())),
        ];
        if let Some(action) = self.action {
            headers.push((X_SCOPEBLIND_ACTION, HeaderValue::from_static(action.as_str())));
        }
        if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            match HeaderValue::from_str(error) {
                Ok(value) => headers.push((X_SCOPEBLIND_ERROR, value)),
                Err(_) => tracing::debug!(error = %error, "Dropping unrepresentable error header"),
            }
        }
        if let Some(remaining) = self.remaining {
            headers.push((X_SCOPEBLIND_REMAINING, HeaderValue::from(remaining)));
        }
        headers
    }
}

/// What the gateway does with a protected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Forward(ForwardMetadata),
    Reject(GatewayError),
}

/// Decide the fate of a protected request. `outcome` is `None` when the
/// request carried no proof and the verifier was never called.
pub fn decide(
    mode: Mode,
    fallback: FallbackPolicy,
    outcome: Option<&VerificationOutcome>,
) -> Decision {
    match (outcome, mode) {
        (None, Mode::Observe) => Decision::Forward(
            ForwardMetadata::new(mode, VerifiedStatus::Missing)
                .with_action(DecisionAction::WouldBlock),
        ),
        (None, Mode::Enforce) => Decision::Reject(GatewayError::ProofRequired),

        (Some(VerificationOutcome::Rejected { reason }), Mode::Observe) => {
            let mut meta = ForwardMetadata::new(mode, VerifiedStatus::Failed)
                .with_action(DecisionAction::WouldBlock);
            meta.error = Some(reason.clone());
            Decision::Forward(meta)
        }
        (Some(VerificationOutcome::Rejected { reason }), Mode::Enforce) => {
            Decision::Reject(GatewayError::RateLimited(reason.clone()))
        }

        (Some(VerificationOutcome::Unreachable { .. }), Mode::Enforce)
            if fallback == FallbackPolicy::Closed =>
        {
            Decision::Reject(GatewayError::VerificationUnavailable)
        }
        (Some(VerificationOutcome::Unreachable { .. }), _) => Decision::Forward(
            ForwardMetadata::new(mode, VerifiedStatus::Error)
                .with_action(DecisionAction::FallbackAllow),
        ),

        (Some(VerificationOutcome::Verified { remaining }), _) => {
            let mut meta = ForwardMetadata::new(mode, VerifiedStatus::True);
            meta.remaining = *remaining;
            Decision::Forward(meta)
        }
    }
}
