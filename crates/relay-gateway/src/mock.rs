//! In-memory gateway for tests.
//!
//! Records every call, can inject failures and latency, and optionally nets
//! placed orders into its own position book so a sequence of signals sees
//! the effect of earlier orders.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, ExchangeGateway};
use crate::types::{Account, OrderAck, PlaceOrderRequest, PositionRecord};

/// Call boundary observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    FetchStarted,
    FetchFinished,
    PlaceStarted(String),
    PlaceFinished(String),
}

/// Mock exchange gateway.
#[derive(Debug)]
pub struct MockGateway {
    positions: Mutex<Vec<PositionRecord>>,
    /// Queued results for `place_order`; an empty queue acks.
    place_results: Mutex<VecDeque<GatewayResult<OrderAck>>>,
    /// Queued failures for `get_open_positions`; an empty queue succeeds.
    fetch_errors: Mutex<VecDeque<GatewayError>>,
    latency: Mutex<Duration>,
    simulate_fills: AtomicBool,
    orders: Mutex<Vec<PlaceOrderRequest>>,
    events: Mutex<Vec<GatewayEvent>>,
    fetch_calls: AtomicU64,
    ack_seq: AtomicU64,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            positions: Mutex::new(Vec::new()),
            place_results: Mutex::new(VecDeque::new()),
            fetch_errors: Mutex::new(VecDeque::new()),
            latency: Mutex::new(Duration::ZERO),
            simulate_fills: AtomicBool::new(false),
            orders: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            ack_seq: AtomicU64::new(0),
        }
    }

    /// Mock that nets placed orders into its position book.
    pub fn with_fills() -> Self {
        let mock = Self::new();
        mock.set_simulate_fills(true);
        mock
    }

    pub fn set_positions(&self, positions: Vec<PositionRecord>) {
        *self.positions.lock() = positions;
    }

    pub fn positions(&self) -> Vec<PositionRecord> {
        self.positions.lock().clone()
    }

    /// Queue a result for the next `place_order` call.
    pub fn push_place_result(&self, result: GatewayResult<OrderAck>) {
        self.place_results.lock().push_back(result);
    }

    /// Queue a failure for the next `get_open_positions` call.
    pub fn push_fetch_error(&self, error: GatewayError) {
        self.fetch_errors.lock().push_back(error);
    }

    /// Delay applied inside every call, between its start and finish events.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn set_simulate_fills(&self, enabled: bool) {
        self.simulate_fills.store(enabled, Ordering::SeqCst);
    }

    /// Orders that reached `place_order`, including rejected ones.
    pub fn orders(&self) -> Vec<PlaceOrderRequest> {
        self.orders.lock().clone()
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events.lock().clone()
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.orders.lock().clear();
        self.events.lock().clear();
        self.fetch_calls.store(0, Ordering::SeqCst);
    }

    async fn pause(&self) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn next_ack(&self) -> OrderAck {
        let seq = self.ack_seq.fetch_add(1, Ordering::SeqCst) + 1;
        OrderAck {
            tx_hash: format!("mock-{seq}"),
            status: Some("ACCEPTED".to_string()),
        }
    }

    /// Net an accepted order into the position book.
    fn apply_fill(&self, request: &PlaceOrderRequest) -> GatewayResult<()> {
        let mut positions = self.positions.lock();
        let existing = positions
            .iter()
            .position(|p| p.market == request.market && p.is_open());

        let current = match existing {
            Some(idx) => Decimal::from_str(&positions[idx].size).map_err(|e| {
                GatewayError::InvalidResponse(format!("bad mock position size: {e}"))
            })?,
            None => Decimal::ZERO,
        };

        let mut delta = match request.side.as_str() {
            "BUY" => request.size.inner(),
            "SELL" => -request.size.inner(),
            other => return Err(GatewayError::Rejected(format!("unknown side {other}"))),
        };

        if request.reduce_only {
            if current.is_zero() {
                return Err(GatewayError::Rejected(
                    "reduce-only order with no open position".to_string(),
                ));
            }
            if current.is_sign_positive() == delta.is_sign_positive() {
                return Err(GatewayError::Rejected(
                    "reduce-only order would increase position".to_string(),
                ));
            }
            // Never flips through zero.
            if delta.abs() > current.abs() {
                delta = -current;
            }
        }

        let next = current + delta;
        match existing {
            Some(idx) if next.is_zero() => {
                positions.remove(idx);
            }
            Some(idx) => {
                positions[idx].size = next.normalize().to_string();
                positions[idx].side = side_label(next).to_string();
            }
            None => positions.push(PositionRecord::open(
                request.market.clone(),
                side_label(next),
                &next.normalize().to_string(),
            )),
        }
        Ok(())
    }
}

fn side_label(size: Decimal) -> &'static str {
    if size.is_sign_negative() {
        "SHORT"
    } else {
        "LONG"
    }
}

impl ExchangeGateway for MockGateway {
    fn get_open_positions<'a>(
        &'a self,
        _account: &'a Account,
    ) -> BoxFuture<'a, GatewayResult<Vec<PositionRecord>>> {
        Box::pin(async move {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.events.lock().push(GatewayEvent::FetchStarted);
            self.pause().await;

            let result = match self.fetch_errors.lock().pop_front() {
                Some(err) => Err(err),
                None => Ok(self.positions.lock().clone()),
            };

            self.events.lock().push(GatewayEvent::FetchFinished);
            result
        })
    }

    fn place_order<'a>(
        &'a self,
        _account: &'a Account,
        request: PlaceOrderRequest,
    ) -> BoxFuture<'a, GatewayResult<OrderAck>> {
        Box::pin(async move {
            let market = request.market.clone();
            self.events
                .lock()
                .push(GatewayEvent::PlaceStarted(market.clone()));
            self.orders.lock().push(request.clone());
            self.pause().await;

            let queued = self.place_results.lock().pop_front();
            let result = match queued {
                Some(result) => result,
                None if self.simulate_fills.load(Ordering::SeqCst) => {
                    self.apply_fill(&request).map(|()| self.next_ack())
                }
                None => Ok(self.next_ack()),
            };

            self.events.lock().push(GatewayEvent::PlaceFinished(market));
            result
        })
    }

    fn network(&self) -> &str {
        "mock"
    }
}
