//! Error types for relay-core.

use thiserror::Error;

/// Core error types.
///
/// Every variant describes a malformed inbound signal; none of them is
/// ever produced once a `Signal` has been constructed.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid market: {0}")]
    InvalidMarket(String),

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
