//! Prometheus metrics for the signal relay.
//!
//! Covers the signal pipeline end to end:
//! - Signals received and their outcomes
//! - Snapshot fetch failures
//! - Dispatch results, retries and latency
//! - Per-market lock contention
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on
//! duplicate metric names, which is a startup bug, and only during static
//! initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Signals accepted by the inbound endpoint.
pub static SIGNALS_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_signals_received_total",
        "Total signals received",
        &["market"]
    )
    .unwrap()
});

/// Malformed signal payloads.
pub static SIGNALS_INVALID_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "relay_signals_invalid_total",
        "Total signal payloads rejected as malformed"
    )
    .unwrap()
});

/// Final outcome per signal.
/// Labels: outcome (dispatched/no_action/fetch_failed/dispatch_failed)
pub static SIGNAL_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_signal_outcomes_total",
        "Signal processing outcomes",
        &["market", "outcome"]
    )
    .unwrap()
});

/// Snapshot fetch failures.
pub static SNAPSHOT_FETCH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_snapshot_fetch_failures_total",
        "Position snapshot fetch failures",
        &["market"]
    )
    .unwrap()
});

/// Dispatch results.
/// Labels: result (ok/transient/rejected)
pub static DISPATCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_dispatch_total",
        "Order dispatch results",
        &["market", "result"]
    )
    .unwrap()
});

/// Retries after a transient dispatch failure.
pub static DISPATCH_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "relay_dispatch_retries_total",
        "Order dispatch retries after transient failures",
        &["market"]
    )
    .unwrap()
});

/// Dispatch latency including retries, in milliseconds.
pub static DISPATCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "relay_dispatch_latency_ms",
        "Order dispatch latency in milliseconds (including retries)",
        &["market"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Time spent waiting for the per-market slot, in milliseconds.
pub static LOCK_WAIT_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "relay_lock_wait_ms",
        "Per-market lock wait in milliseconds",
        &["market"],
        vec![0.1, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Number of per-market slots created.
pub static MARKET_SLOTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("relay_market_slots", "Per-market lock slots created").unwrap()
});

/// Ledger write failures.
pub static LEDGER_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "relay_ledger_failures_total",
        "Auxiliary order ledger write failures"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn signal_received(market: &str) {
        SIGNALS_RECEIVED_TOTAL.with_label_values(&[market]).inc();
    }

    pub fn signal_invalid() {
        SIGNALS_INVALID_TOTAL.inc();
    }

    /// Record the final outcome of a signal.
    pub fn signal_outcome(market: &str, outcome: &str) {
        SIGNAL_OUTCOMES_TOTAL
            .with_label_values(&[market, outcome])
            .inc();
    }

    pub fn snapshot_fetch_failed(market: &str) {
        SNAPSHOT_FETCH_FAILURES_TOTAL
            .with_label_values(&[market])
            .inc();
    }

    /// Record a dispatch result and its total latency.
    pub fn dispatch_result(market: &str, result: &str, latency_ms: f64) {
        DISPATCH_TOTAL.with_label_values(&[market, result]).inc();
        DISPATCH_LATENCY_MS
            .with_label_values(&[market])
            .observe(latency_ms);
    }

    pub fn dispatch_retry(market: &str) {
        DISPATCH_RETRIES_TOTAL.with_label_values(&[market]).inc();
    }

    pub fn lock_wait(market: &str, wait_ms: f64) {
        LOCK_WAIT_MS.with_label_values(&[market]).observe(wait_ms);
    }

    pub fn market_slots(count: usize) {
        MARKET_SLOTS.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn ledger_failure() {
        LEDGER_FAILURES_TOTAL.inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
