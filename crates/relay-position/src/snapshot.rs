//! Exchange position snapshots.
//!
//! A snapshot is never cached: every reconciliation fetches a fresh one so
//! the decision always reflects the exchange's latest view.

use relay_core::{Market, OrderSide, Price, Size};
use relay_gateway::{Account, DynGateway, PositionRecord};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PositionError, PositionResult};

/// Open position for one market as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionSnapshot {
    pub market: Market,
    pub exists: bool,
    /// Only meaningful when `exists`.
    pub side: OrderSide,
    /// As reported: negative for shorts on most venues.
    pub size: Size,
    pub entry_price: Option<Price>,
}

impl PositionSnapshot {
    /// No open position in `market`.
    pub fn none(market: Market) -> Self {
        Self {
            market,
            exists: false,
            side: OrderSide::Buy,
            size: Size::ZERO,
            entry_price: None,
        }
    }

    pub fn open(market: Market, side: OrderSide, size: Size) -> Self {
        Self {
            market,
            exists: true,
            side,
            size,
            entry_price: None,
        }
    }

    pub fn with_entry_price(mut self, price: Price) -> Self {
        self.entry_price = Some(price);
        self
    }

    fn from_record(market: &Market, record: &PositionRecord) -> PositionResult<Self> {
        let decode = |reason: String| PositionError::Decode {
            market: market.to_string(),
            reason,
        };

        let side = parse_side(&record.side)
            .ok_or_else(|| decode(format!("unknown side {:?}", record.side)))?;
        let size: Size = record
            .size
            .parse()
            .map_err(|e| decode(format!("bad size {:?}: {e}", record.size)))?;
        // Entry price is informational; a malformed one is not worth failing over.
        let entry_price = record
            .entry_price
            .as_deref()
            .and_then(|p| p.parse::<Price>().ok());

        Ok(Self {
            market: market.clone(),
            exists: true,
            side,
            size,
            entry_price,
        })
    }
}

/// Map an exchange position side (LONG/SHORT, or BUY/SELL on some venues).
fn parse_side(side: &str) -> Option<OrderSide> {
    match side.trim().to_ascii_uppercase().as_str() {
        "LONG" | "BUY" => Some(OrderSide::Buy),
        "SHORT" | "SELL" => Some(OrderSide::Sell),
        _ => None,
    }
}

/// Fetches fresh position snapshots through the injected gateway.
#[derive(Clone)]
pub struct SnapshotFetcher {
    gateway: DynGateway,
    account: Account,
}

impl SnapshotFetcher {
    pub fn new(gateway: DynGateway, account: Account) -> Self {
        Self { gateway, account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Current open position in `market`.
    ///
    /// Assumes the exchange reports at most one open position per market;
    /// if it ever reports more, the first open match is used.
    pub async fn fetch(&self, market: &Market) -> PositionResult<PositionSnapshot> {
        let records = self
            .gateway
            .get_open_positions(&self.account)
            .await
            .map_err(|e| {
                warn!(market = %market, account = %self.account, error = %e, "Position fetch failed");
                PositionError::from(e)
            })?;

        let snapshot = match records
            .iter()
            .find(|r| r.is_open() && r.market.eq_ignore_ascii_case(market.as_str()))
        {
            Some(record) => PositionSnapshot::from_record(market, record)?,
            None => PositionSnapshot::none(market.clone()),
        };

        debug!(
            market = %market,
            exists = snapshot.exists,
            side = %snapshot.side,
            size = %snapshot.size,
            "Position snapshot"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for SnapshotFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotFetcher")
            .field("network", &self.gateway.network())
            .field("account", &self.account)
            .finish()
    }
}
