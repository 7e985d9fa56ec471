//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Origin and verifier must be absolute http(s) URLs
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - The origin deadline must expire before the whole-request timeout
//! - Protected methods must be valid HTTP method tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} is not an absolute http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("timeouts.origin_response_secs ({origin}) must be below timeouts.request_secs ({request})")]
    OriginOutlivesRequest { origin: u64, request: u64 },

    #[error("invalid protected method: {0}")]
    InvalidMethod(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("gateway.origin_url", &config.gateway.origin_url, &mut errors);
    check_url("gateway.verifier_url", &config.gateway.verifier_url, &mut errors);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.request_secs" });
    }
    if config.timeouts.verifier_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.verifier_ms" });
    }
    if config.timeouts.origin_connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.origin_connect_secs" });
    }
    if config.timeouts.origin_response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.origin_response_secs" });
    } else if config.timeouts.origin_response_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::OriginOutlivesRequest {
            origin: config.timeouts.origin_response_secs,
            request: config.timeouts.request_secs,
        });
    }

    for method in &config.gateway.protected_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::Missing { field });
        return;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
