//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid market in configuration: {0}")]
    Market(#[from] relay_core::CoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] relay_gateway::GatewayError),

    #[error("Server error: {0}")]
    Server(#[from] relay_server::ServerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] relay_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
