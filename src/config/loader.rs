//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{FallbackPolicy, GatewayConfig, Mode};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, normalize and validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    finalize(config)
}

/// Parse configuration from a TOML string (no environment overrides).
pub fn load_config_str(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    finalize(config)
}

fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    config.gateway.normalize_methods();
    validate_config(&config).map_err(ConfigError::Validation)?;

    if config.gateway.protected_methods.is_empty() {
        tracing::warn!("No protected methods configured; proof verification will never run");
    }

    Ok(config)
}

/// Overlay deployment environment variables onto a parsed config.
///
/// `lookup` abstracts `std::env::var` so overrides can be tested without
/// touching the process environment.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(origin) = lookup("ORIGIN_URL") {
        config.gateway.origin_url = origin;
    }
    if let Some(verifier) = lookup("VERIFIER_URL") {
        config.gateway.verifier_url = verifier;
    }
    if let Some(bind) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = bind;
    }

    if let Some(shadow) = lookup("SHADOW_MODE") {
        config.gateway.mode = match shadow.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Mode::Observe,
            "false" | "0" | "no" => Mode::Enforce,
            _ => return Err(ConfigError::Env { var: "SHADOW_MODE", value: shadow }),
        };
    }

    if let Some(fallback) = lookup("FALLBACK_POLICY") {
        config.gateway.fallback = match fallback.trim().to_ascii_lowercase().as_str() {
            "open" => FallbackPolicy::Open,
            "closed" => FallbackPolicy::Closed,
            _ => return Err(ConfigError::Env { var: "FALLBACK_POLICY", value: fallback }),
        };
    }

    if let Some(methods) = lookup("PROTECTED_METHODS") {
        config.gateway.protected_methods = methods.split(',').map(str::to_string).collect();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[listener]
bind_address = "127.0.0.1:8088"

[gateway]
origin_url = "https://api.example.com"
verifier_url = "https://verify.example.com/v1/verify"
mode = "enforce"
fallback = "closed"
protected_methods = ["post", "Post", "delete"]

[timeouts]
verifier_ms = 1500
"#;

    #[test]
    fn test_load_from_str() {
        let config = load_config_str(SAMPLE).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8088");
        assert_eq!(config.gateway.mode, Mode::Enforce);
        assert_eq!(config.gateway.fallback, FallbackPolicy::Closed);
        assert_eq!(config.gateway.protected_methods, vec!["POST", "DELETE"]);
        assert_eq!(config.timeouts.verifier_ms, 1500);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_load_reports_validation() {
        let err = load_config_str("[gateway]\norigin_url = \"not a url\"").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ORIGIN_URL", "http://origin.internal:3000"),
            ("SHADOW_MODE", "false"),
            ("FALLBACK_POLICY", "CLOSED"),
            ("PROTECTED_METHODS", "post, put"),
        ]);
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.gateway.origin_url, "http://origin.internal:3000");
        assert_eq!(config.gateway.mode, Mode::Enforce);
        assert_eq!(config.gateway.fallback, FallbackPolicy::Closed);

        config.gateway.normalize_methods();
        assert_eq!(config.gateway.protected_methods, vec!["POST", "PUT"]);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "SHADOW_MODE").then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "SHADOW_MODE", .. }));
    }
}
