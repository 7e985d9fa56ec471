//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → GET /_scopeblind/health → health report
//!     → everything else → gateway pipeline
//!         → request.rs (method, path, client, origin, request ID)
//!         → cors.rs (preflight, allow-origin on every response)
//! ```

pub mod cors;
pub mod request;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{AppState, HttpServer, HEALTH_PATH};
