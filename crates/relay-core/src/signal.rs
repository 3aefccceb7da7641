//! Inbound trading signal types.
//!
//! A [`RawSignal`] is the payload exactly as the alerting source posts it:
//! every field a string, any of them possibly missing. Converting it into a
//! [`Signal`] is the only validation step; a `Signal` that exists is
//! well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::{Market, OrderSide, Price, Size};

/// Position the alert source wants to hold after this signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredPosition {
    Long,
    Short,
    Flat,
}

impl DesiredPosition {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for DesiredPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesiredPosition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            "flat" => Ok(Self::Flat),
            _ => Err(CoreError::InvalidPosition(s.to_string())),
        }
    }
}

/// Webhook payload as received.
///
/// Field names match the alert template:
/// `market`, `position` ({{strategy.market_position}}),
/// `side` ({{strategy.order.action}}), `price`, `size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSignal {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl RawSignal {
    /// Validate into a [`Signal`].
    pub fn validate(self) -> Result<Signal> {
        Signal::try_from(self)
    }
}

/// Validated directional trading instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub market: Market,
    pub position: DesiredPosition,
    /// Execution side of the order the alert source placed.
    pub side: OrderSide,
    /// Non-negative.
    pub price: Price,
    /// Non-negative.
    pub size: Size,
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CoreError::MissingField(field)),
    }
}

impl TryFrom<RawSignal> for Signal {
    type Error = CoreError;

    fn try_from(raw: RawSignal) -> Result<Self> {
        let market = Market::parse(&required(raw.market, "market")?)?;
        let position = required(raw.position, "position")?.parse()?;
        let side = required(raw.side, "side")?.parse()?;

        let price_str = required(raw.price, "price")?;
        let price: Price = price_str
            .parse()
            .map_err(|e| CoreError::InvalidPrice(format!("{price_str:?}: {e}")))?;
        if price.is_negative() {
            return Err(CoreError::InvalidPrice(format!(
                "price must be non-negative, got {price}"
            )));
        }

        let size_str = required(raw.size, "size")?;
        let size: Size = size_str
            .parse()
            .map_err(|e| CoreError::InvalidSize(format!("{size_str:?}: {e}")))?;
        if size.is_negative() {
            return Err(CoreError::InvalidSize(format!(
                "size must be non-negative, got {size}"
            )));
        }

        Ok(Self {
            market,
            position,
            side,
            price,
            size,
        })
    }
}
