//! Proof-verifying edge gateway library.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
