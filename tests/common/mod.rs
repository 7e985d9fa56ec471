//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use scopeblind_gateway::config::{FallbackPolicy, GatewayConfig, Mode};
use scopeblind_gateway::{HttpServer, Shutdown};

/// A request as seen by a mock backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    fn capture(method: &str, path: &str, query: Option<&str>, headers: &HeaderMap, body: &[u8]) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            headers: headers
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    last: Arc<Mutex<Option<RecordedRequest>>>,
}

impl MockBackend {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last.lock().unwrap().clone()
    }
}

async fn start_backend<F>(respond: F) -> MockBackend
where
    F: Fn(&RecordedRequest) -> Response + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let last = Arc::new(Mutex::new(None));

    let (c, l) = (calls.clone(), last.clone());
    let app = Router::new().fallback(move |request: Request<Body>| {
        let (calls, last, respond) = (c.clone(), l.clone(), respond.clone());
        async move {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            let recorded = RecordedRequest::capture(
                parts.method.as_str(),
                parts.uri.path(),
                parts.uri.query(),
                &parts.headers,
                &bytes,
            );
            calls.fetch_add(1, Ordering::SeqCst);
            let response = respond(&recorded);
            *last.lock().unwrap() = Some(recorded);
            response
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, calls, last }
}

/// Verifier that always answers with `status` and a JSON `body`.
pub async fn start_mock_verifier(status: u16, body: &'static str) -> MockBackend {
    start_backend(move |_| {
        (
            StatusCode::from_u16(status).unwrap(),
            [("content-type", "application/json")],
            body,
        )
            .into_response()
    })
    .await
}

/// Origin that answers 201 with the request it received, as JSON.
pub async fn start_echo_origin() -> MockBackend {
    start_backend(|recorded| {
        (
            StatusCode::CREATED,
            [("x-origin-served", "yes"), ("access-control-allow-origin", "https://leak.example")],
            Json(recorded.clone()),
        )
            .into_response()
    })
    .await
}

/// Accepts connections and never answers.
pub async fn start_hanging_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address with nothing listening on it.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn gateway_config(origin: &str, verifier: &str, mode: Mode, fallback: FallbackPolicy) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.gateway.origin_url = origin.to_string();
    config.gateway.verifier_url = verifier.to_string();
    config.gateway.mode = mode;
    config.gateway.fallback = fallback;
    config.gateway.protected_methods = vec!["POST".into(), "PUT".into(), "DELETE".into()];
    config.timeouts.verifier_ms = 1_000;
    config
}

/// Spawn the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
