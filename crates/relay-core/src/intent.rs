//! Order intent produced by reconciliation.

use serde::{Deserialize, Serialize};

use crate::{ClientOrderId, Market, OrderSide, OrderType, Price, Size};

/// A single order the relay has decided to submit.
///
/// Invariants (upheld by the reconciliation engine, not by construction):
/// - `size` is strictly positive;
/// - `reduce_only` is set only when the order closes or shrinks an
///   existing position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub market: Market,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub size: Size,
    pub price: Price,
    pub reduce_only: bool,
    pub client_id: ClientOrderId,
}

impl OrderIntent {
    /// Whether the intent may be sent to the exchange.
    pub fn is_dispatchable(&self) -> bool {
        self.size.is_positive()
    }
}
