//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health route and the gateway fallback
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Bind server to listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, GatewayInitError};
use crate::http::cors;
use crate::http::request::RequestContext;
use crate::lifecycle::signals;

/// Liveness/diagnostic path, answered before any gateway logic.
pub const HEALTH_PATH: &str = "/_scopeblind/health";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayInitError> {
        let gateway = Arc::new(Gateway::from_config(&config)?);
        let router = Self::build_router(&config, AppState { gateway });
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(HEALTH_PATH, get(health_handler).fallback(gateway_handler))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server until an OS signal or a `shutdown` broadcast arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.gateway.mode,
            fallback = %self.config.gateway.fallback,
            origin = %self.config.gateway.origin_url,
            verifier = %self.config.gateway.verifier_url,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown triggered");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let ctx = RequestContext::from_request(&request);
    let mut response = Json(state.gateway.health()).into_response();
    cors::apply_allow_origin(response.headers_mut(), ctx.origin.as_deref());
    response
}

async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.gateway.handle(request).await
}
