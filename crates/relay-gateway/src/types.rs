//! Exchange-facing request and response types.
//!
//! Shapes follow the perpetual exchange indexer's REST API: positions are
//! reported with string-encoded decimals and upper-case enums.

use serde::{Deserialize, Serialize};
use std::fmt;

use relay_core::{ClientOrderId, OrderIntent, OrderType, Price, Size};

/// Trading account: wallet address plus subaccount number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub subaccount: u32,
}

impl Account {
    pub fn new(address: impl Into<String>, subaccount: u32) -> Self {
        Self {
            address: address.into(),
            subaccount,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.subaccount)
    }
}

/// Position lifecycle status as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
    Liquidated,
    Other(String),
}

impl PositionStatus {
    /// Case-insensitive parse; unknown statuses are kept verbatim.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Self::Open,
            "CLOSED" => Self::Closed,
            "LIQUIDATED" => Self::Liquidated,
            _ => Self::Other(s.to_string()),
        }
    }
}

/// Perpetual position entry from the indexer.
///
/// Endpoint: `GET /v4/perpetualPositions?address=..&subaccountNumber=..`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    /// Market symbol (e.g. "SOL-USD").
    pub market: String,
    /// "OPEN", "CLOSED" or "LIQUIDATED".
    pub status: String,
    /// "LONG" or "SHORT".
    pub side: String,
    /// Signed size: negative for shorts.
    pub size: String,
    #[serde(default)]
    pub max_size: Option<String>,
    #[serde(default)]
    pub entry_price: Option<String>,
    #[serde(default)]
    pub exit_price: Option<String>,
    #[serde(default)]
    pub realized_pnl: Option<String>,
    #[serde(default)]
    pub unrealized_pnl: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_at_height: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub sum_open: Option<String>,
    #[serde(default)]
    pub sum_close: Option<String>,
    #[serde(default)]
    pub net_funding: Option<String>,
}

impl PositionRecord {
    /// Minimal open record, mostly for tests and simulations.
    pub fn open(market: impl Into<String>, side: &str, size: &str) -> Self {
        Self {
            market: market.into(),
            status: "OPEN".to_string(),
            side: side.to_string(),
            size: size.to_string(),
            max_size: None,
            entry_price: None,
            exit_price: None,
            realized_pnl: None,
            unrealized_pnl: None,
            created_at: None,
            created_at_height: None,
            closed_at: None,
            sum_open: None,
            sum_close: None,
            net_funding: None,
        }
    }

    pub fn status(&self) -> PositionStatus {
        PositionStatus::parse(&self.status)
    }

    pub fn is_open(&self) -> bool {
        self.status() == PositionStatus::Open
    }
}

/// Wrapper object returned by the positions endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub positions: Vec<PositionRecord>,
}

/// Order submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub market: String,
    /// "BUY" or "SELL".
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: Price,
    pub size: Size,
    pub client_id: ClientOrderId,
    pub reduce_only: bool,
}

impl From<&OrderIntent> for PlaceOrderRequest {
    fn from(intent: &OrderIntent) -> Self {
        Self {
            market: intent.market.to_string(),
            side: intent.side.as_wire().to_string(),
            order_type: intent.order_type,
            price: intent.price,
            size: intent.size,
            client_id: intent.client_id,
            reduce_only: intent.reduce_only,
        }
    }
}

/// Exchange acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    /// Transaction hash / exchange order id.
    #[serde(alias = "hash", alias = "orderId")]
    pub tx_hash: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderAck {
    /// Status given to an accepted submission whose body could not be read.
    pub const UNCONFIRMED: &'static str = "UNCONFIRMED";

    /// Ack for a 2xx submission with an unreadable body. The order may be
    /// live on the exchange, but no hash is known.
    pub fn unconfirmed() -> Self {
        Self {
            tx_hash: String::new(),
            status: Some(Self::UNCONFIRMED.to_string()),
        }
    }

    pub fn is_unconfirmed(&self) -> bool {
        self.status.as_deref() == Some(Self::UNCONFIRMED)
    }
}
