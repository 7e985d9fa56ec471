//! Outbound calls must ignore proxy settings from the environment.
//!
//! Kept in its own test binary because it mutates process environment.

use axum::http::StatusCode;
use serde_json::Value;

use scopeblind_gateway::config::{FallbackPolicy, Mode};

mod common;

#[tokio::test]
async fn test_env_proxy_does_not_reroute_outbound_calls() {
    let black_hole = format!("http://{}", common::unused_addr());
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::set_var(var, &black_hole);
    }
    for var in ["NO_PROXY", "no_proxy"] {
        std::env::remove_var(var);
    }

    let origin = common::start_echo_origin().await;
    let verifier = common::start_mock_verifier(200, r#"{"verified":true,"remaining":9}"#).await;
    let config = common::gateway_config(&origin.url(""), &verifier.url("/verify"), Mode::Enforce, FallbackPolicy::Closed);
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(format!("http://{}/v1/orders", addr))
        .header("x-proof", "good-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let seen: Value = res.json().await.unwrap();
    assert_eq!(seen["headers"]["x-scopeblind-verified"], "true");
    assert_eq!(verifier.calls(), 1);
    assert_eq!(origin.calls(), 1);

    shutdown.trigger();
}
