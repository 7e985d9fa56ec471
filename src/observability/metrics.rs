//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scopeblind_requests_total` (counter): requests by method and verified status
//! - `scopeblind_decisions_total` (counter): telemetry events by action and mode
//! - `scopeblind_verifier_duration_seconds` (histogram): verifier latency by outcome
//! - `scopeblind_upstream_errors_total` (counter): failed origin calls
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, verified: &'static str) {
    ::metrics::counter!(
        "scopeblind_requests_total",
        "method" => method.to_string(),
        "verified" => verified
    )
    .increment(1);
}

pub fn record_decision(action: &'static str, mode: &'static str) {
    ::metrics::counter!("scopeblind_decisions_total", "action" => action, "mode" => mode)
        .increment(1);
}

pub fn record_verifier_call(outcome: &'static str, started: Instant) {
    ::metrics::histogram!("scopeblind_verifier_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    ::metrics::counter!("scopeblind_upstream_errors_total").increment(1);
}
