//! Webhook-to-exchange signal relay.
//!
//! Main application that wires the components together:
//! - TOML configuration and exchange credentials
//! - Exchange gateway (REST)
//! - Signal executor with per-market serialization and retrying dispatch
//! - Optional JSON order ledger
//! - Inbound webhook HTTP server

pub mod app;
pub mod config;
pub mod error;

pub use app::{init_logging, Application};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
