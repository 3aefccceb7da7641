//! Market symbol type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Exchange market symbol (e.g. "SOL-USD", "BTC-USD").
///
/// Always non-empty, free of whitespace and upper-cased. Used as the key
/// for per-market serialization, so two signals for the same market must
/// produce equal values whatever casing the alert template used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Market(String);

impl Market {
    /// Parse and validate a market symbol.
    pub fn parse(symbol: &str) -> Result<Self> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidMarket("market symbol is empty".to_string()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidMarket(format!(
                "market symbol contains whitespace: {symbol:?}"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Market {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Market {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Market> for String {
    fn from(m: Market) -> Self {
        m.0
    }
}
