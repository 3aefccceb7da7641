//! Server error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use relay_executor::ExecutorError;
use relay_persistence::PersistenceError;
use relay_telemetry::TelemetryError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Market not allowed: {0}")]
    MarketNotAllowed(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Order ledger is not enabled")]
    LedgerDisabled,

    #[error("Ledger error: {0}")]
    Ledger(#[from] PersistenceError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSignal(_) | Self::MarketNotAllowed(_) => StatusCode::BAD_REQUEST,
            Self::Executor(ExecutorError::SnapshotFetchFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Executor(ExecutorError::DispatchFailed(e)) if e.is_transient() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Executor(ExecutorError::DispatchFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::LedgerDisabled => StatusCode::NOT_FOUND,
            Self::Ledger(_) | Self::Metrics(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
