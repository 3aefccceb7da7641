//! Inbound HTTP surface for the signal relay.
//!
//! Receives webhook signals, hands them to the [`relay_executor::SignalExecutor`]
//! and maps the outcome to an HTTP response. Also serves liveness, the order
//! ledger and Prometheus metrics.

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{create_router, run_server};
pub use state::AppState;
