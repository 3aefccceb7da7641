//! Per-signal pipeline.
//!
//! For each signal, while holding its market's slot:
//! 1. fetch a fresh position snapshot (failure abandons the signal)
//! 2. reconcile it against the signal (may decide no-op)
//! 3. dispatch the resulting order
//! 4. record the order in the ledger, if one is attached
//!
//! Failures are isolated to the signal that hit them.

use std::sync::Arc;

use chrono::Utc;
use relay_core::{ClientOrderId, Market, OrderIntent, Signal};
use relay_gateway::{Account, DynGateway, OrderAck};
use relay_persistence::{JsonLedger, LedgerEntry};
use relay_position::{reconcile, NoOpReason, SnapshotFetcher};
use relay_telemetry::Metrics;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::dispatcher::{OrderDispatcher, RetryConfig};
use crate::error::{ExecutorError, ExecutorResult};
use crate::serializer::MarketLocks;

/// Result of a successfully processed signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalOutcome {
    NoAction { market: Market, reason: NoOpReason },
    Dispatched { intent: OrderIntent, ack: OrderAck },
}

impl SignalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoAction { .. } => "no_action",
            Self::Dispatched { .. } => "dispatched",
        }
    }
}

/// Runs signals through fetch → reconcile → dispatch under per-market locks.
#[derive(Debug)]
pub struct SignalExecutor {
    locks: MarketLocks,
    fetcher: SnapshotFetcher,
    dispatcher: OrderDispatcher,
    client_id: ClientOrderId,
    ledger: Option<Arc<JsonLedger>>,
}

impl SignalExecutor {
    pub fn new(
        gateway: DynGateway,
        account: Account,
        client_id: ClientOrderId,
        retry: RetryConfig,
    ) -> Self {
        Self {
            locks: MarketLocks::new(),
            fetcher: SnapshotFetcher::new(Arc::clone(&gateway), account.clone()),
            dispatcher: OrderDispatcher::new(gateway, account, retry),
            client_id,
            ledger: None,
        }
    }

    /// Record every dispatched order in `ledger`.
    pub fn with_ledger(mut self, ledger: Arc<JsonLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn ledger(&self) -> Option<&Arc<JsonLedger>> {
        self.ledger.as_ref()
    }

    pub fn slot_count(&self) -> usize {
        self.locks.slot_count()
    }

    /// Process one validated signal.
    pub async fn on_signal(&self, signal: Signal) -> ExecutorResult<SignalOutcome> {
        Metrics::signal_received(signal.market.as_str());

        let market = signal.market.clone();
        let result = self
            .locks
            .with_market_lock(&market, || self.process(&signal))
            .await;

        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(ExecutorError::SnapshotFetchFailed(_)) => "fetch_failed",
            Err(ExecutorError::DispatchFailed(_)) => "dispatch_failed",
        };
        Metrics::signal_outcome(market.as_str(), label);
        result
    }

    async fn process(&self, signal: &Signal) -> ExecutorResult<SignalOutcome> {
        info!(
            market = %signal.market,
            position = %signal.position,
            side = %signal.side,
            price = %signal.price,
            size = %signal.size,
            "Processing signal"
        );

        let snapshot = match self.fetcher.fetch(&signal.market).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                Metrics::snapshot_fetch_failed(signal.market.as_str());
                error!(market = %signal.market, error = %e, "Abandoning signal: snapshot unavailable");
                return Err(e.into());
            }
        };

        let intent = match reconcile(signal, &snapshot, self.client_id) {
            Ok(intent) => intent,
            Err(reason) => {
                info!(
                    market = %signal.market,
                    position = %signal.position,
                    reason = %reason,
                    "No order needed"
                );
                return Ok(SignalOutcome::NoAction {
                    market: signal.market.clone(),
                    reason,
                });
            }
        };

        info!(
            market = %intent.market,
            side = %intent.side,
            size = %intent.size,
            reduce_only = intent.reduce_only,
            position_exists = snapshot.exists,
            position_size = %snapshot.size,
            "Reconciled order"
        );

        let ack = self.dispatcher.dispatch(&intent).await?;
        self.record(signal, &intent, &ack).await;

        Ok(SignalOutcome::Dispatched { intent, ack })
    }

    async fn record(&self, signal: &Signal, intent: &OrderIntent, ack: &OrderAck) {
        let Some(ledger) = &self.ledger else {
            return;
        };

        let id = if ack.tx_hash.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            ack.tx_hash.clone()
        };
        let entry = LedgerEntry {
            id,
            market: intent.market.clone(),
            position: signal.position,
            side: intent.side,
            amount: intent.size,
            price: intent.price,
            reduce_only: intent.reduce_only,
            created_at: Utc::now(),
        };

        if let Err(e) = ledger.create(entry).await {
            Metrics::ledger_failure();
            warn!(
                market = %intent.market,
                path = %ledger.path().display(),
                error = %e,
                "Failed to record order in ledger"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{DesiredPosition, OrderSide, Price, Size};
    use relay_gateway::{GatewayError, GatewayEvent, MockGateway, PositionRecord};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tempfile::TempDir;

    fn executor(mock: &Arc<MockGateway>) -> SignalExecutor {
        let retry = RetryConfig {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        };
        SignalExecutor::new(
            Arc::clone(mock) as DynGateway,
            Account::new("dydx1test", 0),
            ClientOrderId::new(11),
            retry,
        )
    }

    fn signal(market: &str, position: DesiredPosition, side: OrderSide, size: Decimal) -> Signal {
        Signal {
            market: Market::parse(market).unwrap(),
            position,
            side,
            price: Price::new(dec!(100)),
            size: Size::new(size),
        }
    }

    fn place_finished(market: &str) -> GatewayEvent {
        GatewayEvent::PlaceFinished(market.to_string())
    }

    // ========================================================================
    // Pipeline outcomes
    // ========================================================================

    #[tokio::test]
    async fn test_open_from_flat_dispatches_signal_verbatim() {
        let mock = Arc::new(MockGateway::with_fills());
        let exec = executor(&mock);

        let outcome = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(5)))
            .await
            .unwrap();

        let (intent, ack) = match outcome {
            SignalOutcome::Dispatched { intent, ack } => (intent, ack),
            other => panic!("expected dispatch, got {other:?}"),
        };
        assert_eq!(intent.side, OrderSide::Buy);
        assert_eq!(intent.size.inner(), dec!(5));
        assert!(!intent.reduce_only);
        assert_eq!(intent.client_id, ClientOrderId::new(11));
        assert_eq!(ack.tx_hash, "mock-1");
        assert_eq!(mock.positions()[0].size, "5");
    }

    #[tokio::test]
    async fn test_flat_without_position_does_not_dispatch() {
        let mock = Arc::new(MockGateway::new());
        let exec = executor(&mock);

        let outcome = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Flat, OrderSide::Sell, dec!(5)))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SignalOutcome::NoAction {
                market: Market::parse("SOL-USD").unwrap(),
                reason: NoOpReason::NothingToClose,
            }
        );
        assert!(mock.orders().is_empty());
        assert_eq!(mock.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_open_reverse_flatten_sequence() {
        let mock = Arc::new(MockGateway::with_fills());
        let exec = executor(&mock);

        exec.on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(5)))
            .await
            .unwrap();
        exec.on_signal(signal("SOL-USD", DesiredPosition::Short, OrderSide::Sell, dec!(3)))
            .await
            .unwrap();
        exec.on_signal(signal("SOL-USD", DesiredPosition::Flat, OrderSide::Buy, dec!(3)))
            .await
            .unwrap();

        let orders = mock.orders();
        assert_eq!(orders.len(), 3);
        assert_eq!((orders[1].side.as_str(), orders[1].size.inner()), ("SELL", dec!(8)));
        assert!(!orders[1].reduce_only);
        assert_eq!((orders[2].side.as_str(), orders[2].size.inner()), ("BUY", dec!(3)));
        assert!(orders[2].reduce_only);
        assert!(mock.positions().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_abandons_signal() {
        let mock = Arc::new(MockGateway::new());
        mock.push_fetch_error(GatewayError::Timeout("indexer".to_string()));
        let exec = executor(&mock);

        let err = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::SnapshotFetchFailed(_)));
        assert!(mock.orders().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_dispatch_surfaces_error() {
        let mock = Arc::new(MockGateway::new());
        mock.set_positions(vec![PositionRecord::open("SOL-USD", "LONG", "5")]);
        mock.push_place_result(Err(GatewayError::Rejected("invalid market".to_string())));
        let exec = executor(&mock);

        let err = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Flat, OrderSide::Sell, dec!(5)))
            .await
            .unwrap_err();

        let ExecutorError::DispatchFailed(dispatch) = err else {
            panic!("expected dispatch failure");
        };
        assert!(!dispatch.is_transient());
        assert_eq!(mock.orders().len(), 1);
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    #[tokio::test]
    async fn test_same_market_signals_never_interleave() {
        let mock = Arc::new(MockGateway::with_fills());
        mock.set_latency(Duration::from_millis(20));
        let exec = executor(&mock);

        let (first, second) = tokio::join!(
            exec.on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(5))),
            exec.on_signal(signal("SOL-USD", DesiredPosition::Short, OrderSide::Sell, dec!(3))),
        );
        first.unwrap();
        second.unwrap();

        let events = mock.events();
        let first_done = events
            .iter()
            .position(|e| *e == place_finished("SOL-USD"))
            .unwrap();
        let second_fetch = events
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == GatewayEvent::FetchStarted)
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        assert!(second_fetch > first_done, "events interleaved: {events:?}");

        // The second signal saw the first one's fill and reversed it.
        assert_eq!(mock.orders()[1].size.inner(), dec!(8));
        assert_eq!(exec.slot_count(), 1);
    }

    #[tokio::test]
    async fn test_different_markets_proceed_concurrently() {
        let mock = Arc::new(MockGateway::new());
        mock.set_latency(Duration::from_millis(20));
        let exec = executor(&mock);

        let (sol, eth) = tokio::join!(
            exec.on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(1))),
            exec.on_signal(signal("ETH-USD", DesiredPosition::Long, OrderSide::Buy, dec!(1))),
        );
        sol.unwrap();
        eth.unwrap();

        let events = mock.events();
        assert_eq!(events[0], GatewayEvent::FetchStarted);
        assert_eq!(events[1], GatewayEvent::FetchStarted);
        assert_eq!(exec.slot_count(), 2);
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    #[tokio::test]
    async fn test_dispatched_orders_are_recorded() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(JsonLedger::new(dir.path().join("db.json")));
        let mock = Arc::new(MockGateway::new());
        let exec = executor(&mock).with_ledger(Arc::clone(&ledger));

        exec.on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(2)))
            .await
            .unwrap();
        exec.on_signal(signal("SOL-USD", DesiredPosition::Flat, OrderSide::Sell, dec!(2)))
            .await
            .unwrap();

        let entries = ledger.read_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "mock-1");
        assert_eq!(entries[0].position, DesiredPosition::Long);
        assert_eq!(entries[0].amount.inner(), dec!(2));
    }

    #[tokio::test]
    async fn test_unconfirmed_ack_is_still_recorded() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(JsonLedger::new(dir.path().join("db.json")));
        let mock = Arc::new(MockGateway::new());
        mock.push_place_result(Ok(OrderAck::unconfirmed()));
        let exec = executor(&mock).with_ledger(Arc::clone(&ledger));

        let outcome = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(2)))
            .await
            .unwrap();
        assert_eq!(outcome.label(), "dispatched");
        assert_eq!(mock.orders().len(), 1);

        let entries = ledger.read_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(uuid::Uuid::parse_str(&entries[0].id).is_ok());
    }

    #[tokio::test]
    async fn test_ledger_failure_does_not_fail_signal() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read or replaced as a ledger file.
        let ledger = Arc::new(JsonLedger::new(dir.path()));
        let mock = Arc::new(MockGateway::new());
        let exec = executor(&mock).with_ledger(ledger);

        let outcome = exec
            .on_signal(signal("SOL-USD", DesiredPosition::Long, OrderSide::Buy, dec!(2)))
            .await
            .unwrap();
        assert_eq!(outcome.label(), "dispatched");
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = SignalOutcome::NoAction {
            market: Market::parse("SOL-USD").unwrap(),
            reason: NoOpReason::NothingToClose,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "no_action");
        assert_eq!(value["market"], "SOL-USD");
        assert_eq!(value["reason"], "nothing_to_close");
    }
}
