//! Signal reconciliation.
//!
//! Compares the desired position carried by a signal with the exchange's
//! current position and produces at most one order.
//!
//! | signal      | snapshot           | order                                        |
//! |-------------|--------------------|----------------------------------------------|
//! | flat        | none               | no-op                                        |
//! | flat        | side S, size Z     | opposite(S), \|Z\|, reduce-only              |
//! | long/short  | none               | signal side and size                         |
//! | long/short  | opposite side      | signal side, signal size + \|Z\|             |
//! | long/short  | same side          | signal side and size (adds to the position)  |
//!
//! Any computed size that is not strictly positive is a no-op, and so is a
//! reversal whose summed size does not fit in a decimal.

use std::fmt;

use relay_core::{ClientOrderId, OrderIntent, OrderType, Signal};
use serde::Serialize;
use tracing::warn;

use crate::snapshot::PositionSnapshot;

/// Why a signal produced no order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// Flat requested with no open position.
    NothingToClose,
    /// Computed order size was zero or negative.
    NonPositiveSize,
    /// Reversal size exceeded the decimal range.
    SizeOverflow,
}

impl NoOpReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NothingToClose => "nothing_to_close",
            Self::NonPositiveSize => "non_positive_size",
            Self::SizeOverflow => "size_overflow",
        }
    }
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the order that aligns `snapshot` with `signal`.
///
/// Pure apart from a warning log for same-side signals.
pub fn reconcile(
    signal: &Signal,
    snapshot: &PositionSnapshot,
    client_id: ClientOrderId,
) -> Result<OrderIntent, NoOpReason> {
    let intent = if signal.position.is_flat() {
        if !snapshot.exists {
            return Err(NoOpReason::NothingToClose);
        }
        OrderIntent {
            market: signal.market.clone(),
            side: snapshot.side.opposite(),
            order_type: OrderType::Market,
            size: snapshot.size.abs(),
            price: signal.price,
            reduce_only: true,
            client_id,
        }
    } else {
        let mut intent = OrderIntent {
            market: signal.market.clone(),
            side: signal.side,
            order_type: OrderType::Market,
            size: signal.size,
            price: signal.price,
            reduce_only: false,
            client_id,
        };

        if snapshot.exists {
            if snapshot.side != signal.side {
                intent.size = signal
                    .size
                    .checked_add(snapshot.size.abs())
                    .ok_or_else(|| {
                        warn!(
                            market = %signal.market,
                            position_size = %snapshot.size,
                            signal_size = %signal.size,
                            "Reversal size overflows; ignoring signal"
                        );
                        NoOpReason::SizeOverflow
                    })?;
            } else {
                warn!(
                    market = %signal.market,
                    side = %signal.side,
                    position_size = %snapshot.size,
                    signal_size = %signal.size,
                    "Same-side signal with open position; adding to position"
                );
            }
        }
        intent
    };

    if !intent.is_dispatchable() {
        return Err(NoOpReason::NonPositiveSize);
    }
    Ok(intent)
}
