//! Per-market mutual exclusion.
//!
//! Each market symbol gets one `tokio::sync::Mutex<()>`, created on first
//! use and kept for the life of the process. The tradable set is finite,
//! so the map stays small. tokio's mutex is FIFO-fair: signals for one
//! market run in the order they started waiting.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use relay_core::Market;
use relay_telemetry::Metrics;
use tokio::sync::Mutex;
use tracing::trace;

/// Lazily populated map of per-market slots.
#[derive(Debug, Default)]
pub struct MarketLocks {
    slots: DashMap<Market, Arc<Mutex<()>>>,
}

impl MarketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, market: &Market) -> Arc<Mutex<()>> {
        if let Some(slot) = self.slots.get(market) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .slots
            .entry(market.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Metrics::market_slots(self.slots.len());
        slot
    }

    /// Run `f` while holding `market`'s slot.
    ///
    /// The slot is released when the returned future completes, errors, or
    /// is dropped, including when `f` panics.
    pub async fn with_market_lock<F, Fut, T>(&self, market: &Market, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = self.slot(market);

        let wait_start = Instant::now();
        let _guard = slot.lock().await;
        let waited = wait_start.elapsed();
        Metrics::lock_wait(market.as_str(), waited.as_secs_f64() * 1000.0);
        trace!(market = %market, wait_us = waited.as_micros() as u64, "Market slot acquired");

        f().await
    }

    /// Number of slots created so far.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
