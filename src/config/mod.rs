//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → schema.rs (normalize protected methods)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc with the request handler
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup; there is no reload or mutation API
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_str, ConfigError};
pub use schema::{
    FallbackPolicy, GatewayConfig, ListenerConfig, LogFormat, Mode, ObservabilityConfig,
    PolicyConfig, TimeoutConfig,
};
