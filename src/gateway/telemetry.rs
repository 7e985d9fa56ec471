//! One structured event per protected request.
//!
//! Events go out as `tracing` events on the `scopeblind::telemetry` target so
//! log shipping can route them separately from operational logs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Mode;
use crate::gateway::verifier::VerificationOutcome;
use crate::http::request::RequestContext;
use crate::observability::metrics;

pub const TELEMETRY_TARGET: &str = "scopeblind::telemetry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryAction {
    NoProof,
    VerifyFailed,
    Verified,
    VerifierError,
}

impl TelemetryAction {
    pub fn for_outcome(outcome: Option<&VerificationOutcome>) -> Self {
        match outcome {
            None => TelemetryAction::NoProof,
            Some(VerificationOutcome::Rejected { .. }) => TelemetryAction::VerifyFailed,
            Some(VerificationOutcome::Unreachable { .. }) => TelemetryAction::VerifierError,
            Some(VerificationOutcome::Verified { .. }) => TelemetryAction::Verified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryAction::NoProof => "no_proof",
            TelemetryAction::VerifyFailed => "verify_failed",
            TelemetryAction::Verified => "verified",
            TelemetryAction::VerifierError => "verifier_error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub action: TelemetryAction,
    pub mode: Mode,
    pub method: String,
    pub path: String,
    pub client: String,
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
}

impl TelemetryEvent {
    pub fn new(ctx: &RequestContext, mode: Mode, outcome: Option<&VerificationOutcome>) -> Self {
        let (error, remaining) = match outcome {
            Some(VerificationOutcome::Rejected { reason }) => (Some(reason.clone()), None),
            Some(VerificationOutcome::Unreachable { cause }) => (Some(cause.clone()), None),
            Some(VerificationOutcome::Verified { remaining }) => (None, *remaining),
            None => (None, None),
        };

        Self {
            action: TelemetryAction::for_outcome(outcome),
            mode,
            method: ctx.method.to_string(),
            path: ctx.path.clone(),
            client: ctx.client.clone(),
            request_id: ctx.request_id.clone(),
            timestamp: Utc::now(),
            error,
            remaining,
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            target: TELEMETRY_TARGET,
            action = self.action.as_str(),
            mode = self.mode.as_str(),
            method = %self.method,
            path = %self.path,
            client = %self.client,
            request_id = self.request_id.as_deref().unwrap_or("-"),
            timestamp = %self.timestamp.to_rfc3339(),
            error = self.error.as_deref(),
            remaining = self.remaining,
            "proof decision"
        );
        metrics::record_decision(self.action.as_str(), self.mode.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn ctx() -> RequestContext {
        RequestContext {
            method: Method::POST,
            path: "/v1/orders".into(),
            client: "203.0.113.9".into(),
            origin: Some("https://app.example.com".into()),
            request_id: Some("req-1".into()),
        }
    }

    #[test]
    fn test_action_for_outcome() {
        assert_eq!(TelemetryAction::for_outcome(None), TelemetryAction::NoProof);
        assert_eq!(
            TelemetryAction::for_outcome(Some(&VerificationOutcome::Rejected {
                reason: "x".into()
            })),
            TelemetryAction::VerifyFailed
        );
        assert_eq!(
            TelemetryAction::for_outcome(Some(&VerificationOutcome::Unreachable {
                cause: "x".into()
            })),
            TelemetryAction::VerifierError
        );
    }

    #[test]
    fn test_event_fields() {
        let outcome = VerificationOutcome::Verified { remaining: Some(3) };
        let event = TelemetryEvent::new(&ctx(), Mode::Enforce, Some(&outcome));
        assert_eq!(event.action, TelemetryAction::Verified);
        assert_eq!(event.remaining, Some(3));
        assert_eq!(event.error, None);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "verified");
        assert_eq!(json["mode"], "enforce");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["client"], "203.0.113.9");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_event_carries_failure_reason() {
        let outcome = VerificationOutcome::Rejected { reason: "quota_exceeded".into() };
        let event = TelemetryEvent::new(&ctx(), Mode::Observe, Some(&outcome));
        assert_eq!(event.action, TelemetryAction::VerifyFailed);
        assert_eq!(event.error.as_deref(), Some("quota_exceeded"));
        event.emit();
    }
}
