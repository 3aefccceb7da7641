//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Exchange unavailable: HTTP {status}: {body}")]
    Unavailable { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether the same request could succeed if sent again later.
    ///
    /// Timeouts, connection drops, rate limits and 5xx responses are
    /// transient. Everything else is a definitive answer from (or about)
    /// the exchange and must not be resent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Connection(_) | Self::RateLimited | Self::Unavailable { .. }
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::HttpClient(e.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
