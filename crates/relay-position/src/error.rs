//! Position error types.

use relay_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Position fetch failed: {0}")]
    FetchFailed(#[from] GatewayError),

    #[error("Undecodable position record for {market}: {reason}")]
    Decode { market: String, reason: String },
}

pub type PositionResult<T> = Result<T, PositionError>;
