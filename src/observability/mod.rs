//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway pipeline produces:
//!     → logging.rs (operational logs + `scopeblind::telemetry` decision events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log shipping (stdout, JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and telemetry events
//! - Metrics are cheap and a no-op when the exporter is disabled

pub mod logging;
pub mod metrics;
