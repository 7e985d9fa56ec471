//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin, verifier and decision policy.
    pub gateway: PolicyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Global operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Never block; annotate what would have happened.
    #[default]
    #[serde(alias = "shadow")]
    Observe,
    /// Reject requests that fail verification.
    Enforce,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Observe => "observe",
            Mode::Enforce => "enforce",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the verifier cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Forward anyway.
    #[default]
    Open,
    /// Reject with 503.
    Closed,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackPolicy::Open => "open",
            FallbackPolicy::Closed => "closed",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin, verifier and decision policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Backend the gateway forwards to (absolute URL; only scheme and
    /// authority are used).
    pub origin_url: String,

    /// Verification endpoint the proof token is POSTed to.
    pub verifier_url: String,

    /// Observe or enforce.
    pub mode: Mode,

    /// Behavior when the verifier is unreachable under enforcement.
    pub fallback: FallbackPolicy,

    /// Methods that require a proof. Normalized to uppercase, deduplicated.
    pub protected_methods: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            origin_url: String::new(),
            verifier_url: String::new(),
            mode: Mode::default(),
            fallback: FallbackPolicy::default(),
            protected_methods: ["POST", "PUT", "PATCH", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl PolicyConfig {
    /// Uppercase, trim and deduplicate the protected methods, keeping first
    /// occurrence order.
    pub fn normalize_methods(&mut self) {
        let mut seen = Vec::with_capacity(self.protected_methods.len());
        for method in &self.protected_methods {
            let method = method.trim().to_ascii_uppercase();
            if !method.is_empty() && !seen.contains(&method) {
                seen.push(method);
            }
        }
        self.protected_methods = seen;
    }
}

/// Timeout configuration for the gateway and its outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,

    /// Verifier call deadline in milliseconds. Expiry counts as unreachable.
    pub verifier_ms: u64,

    /// Origin connection establishment timeout in seconds.
    pub origin_connect_secs: u64,

    /// Time the origin has to produce response headers, in seconds. Expiry
    /// is an upstream failure. Must stay below `request_secs`.
    pub origin_response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            verifier_ms: 5_000,
            origin_connect_secs: 5,
            origin_response_secs: 25,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
