//! Prometheus metrics and structured logging for the signal relay.
//!
//! - Prometheus metrics for signal outcomes, dispatch results and latency
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
