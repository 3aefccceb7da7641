//! Order dispatch with bounded retry.
//!
//! Transient gateway failures (timeouts, connection loss, rate limits,
//! 5xx) are retried with exponential backoff up to `max_retries` times.
//! Rejections are returned immediately: resending a refused order can only
//! produce a duplicate.

use std::time::{Duration, Instant};

use relay_core::OrderIntent;
use relay_gateway::{Account, DynGateway, OrderAck, PlaceOrderRequest};
use relay_telemetry::Metrics;
use tracing::{error, info, warn};

use crate::error::{DispatchError, DispatchErrorKind};

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retry.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.base_delay.as_secs_f64() * self.backoff_multiplier.max(1.0).powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled)
    }
}

/// Submits order intents through the injected gateway.
#[derive(Clone)]
pub struct OrderDispatcher {
    gateway: DynGateway,
    account: Account,
    retry: RetryConfig,
}

impl OrderDispatcher {
    pub fn new(gateway: DynGateway, account: Account, retry: RetryConfig) -> Self {
        Self {
            gateway,
            account,
            retry,
        }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Submit `intent`, retrying transient failures.
    pub async fn dispatch(&self, intent: &OrderIntent) -> Result<OrderAck, DispatchError> {
        let request = PlaceOrderRequest::from(intent);
        let market = intent.market.as_str();
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let err = match self.gateway.place_order(&self.account, request.clone()).await {
                Ok(ack) => {
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    Metrics::dispatch_result(market, "ok", elapsed_ms);
                    info!(
                        market = %intent.market,
                        side = %intent.side,
                        size = %intent.size,
                        reduce_only = intent.reduce_only,
                        tx_hash = %ack.tx_hash,
                        attempts,
                        elapsed_ms,
                        "Order dispatched"
                    );
                    return Ok(ack);
                }
                Err(e) => e,
            };

            let retries_used = attempts - 1;
            if err.is_transient() && retries_used < self.retry.max_retries {
                let delay = self.retry.delay_for(retries_used);
                warn!(
                    market = %intent.market,
                    attempt = attempts,
                    max_retries = self.retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient dispatch failure, retrying"
                );
                Metrics::dispatch_retry(market);
                tokio::time::sleep(delay).await;
                continue;
            }

            let kind = if err.is_transient() {
                DispatchErrorKind::Transient
            } else {
                DispatchErrorKind::Rejected
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            Metrics::dispatch_result(market, kind.as_str(), elapsed_ms);
            error!(
                market = %intent.market,
                side = %intent.side,
                size = %intent.size,
                reduce_only = intent.reduce_only,
                kind = %kind,
                attempts,
                error = %err,
                "Order dispatch failed"
            );
            return Err(DispatchError {
                kind,
                attempts,
                message: err.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for OrderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderDispatcher")
            .field("network", &self.gateway.network())
            .field("account", &self.account)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{ClientOrderId, Market, OrderSide, OrderType, Price, Size};
    use relay_gateway::{GatewayError, MockGateway};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    fn dispatcher(mock: Arc<MockGateway>, retry: RetryConfig) -> OrderDispatcher {
        OrderDispatcher::new(mock, Account::new("dydx1test", 0), retry)
    }

    fn intent() -> OrderIntent {
        OrderIntent {
            market: Market::parse("SOL-USD").unwrap(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            size: Size::new(dec!(5)),
            price: Price::new(dec!(100)),
            reduce_only: false,
            client_id: ClientOrderId::new(3),
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for(2), Duration::from_millis(350));
        assert_eq!(retry.delay_for(40), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_dispatch_success_sends_intent() {
        let mock = Arc::new(MockGateway::new());
        let ack = dispatcher(Arc::clone(&mock), fast_retry(2))
            .dispatch(&intent())
            .await
            .unwrap();

        assert_eq!(ack.tx_hash, "mock-1");
        let orders = mock.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, "BUY");
        assert_eq!(orders[0].client_id, ClientOrderId::new(3));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mock = Arc::new(MockGateway::new());
        mock.push_place_result(Err(GatewayError::RateLimited));
        mock.push_place_result(Err(GatewayError::Timeout("slow".to_string())));

        let ack = dispatcher(Arc::clone(&mock), fast_retry(2))
            .dispatch(&intent())
            .await
            .unwrap();
        assert!(ack.tx_hash.starts_with("mock-"));
        assert_eq!(mock.orders().len(), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let mock = Arc::new(MockGateway::new());
        mock.push_place_result(Err(GatewayError::Rejected("insufficient margin".to_string())));

        let err = dispatcher(Arc::clone(&mock), fast_retry(3))
            .dispatch(&intent())
            .await
            .unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::Rejected);
        assert_eq!(err.attempts, 1);
        assert!(err.message.contains("insufficient margin"));
        assert_eq!(mock.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mock = Arc::new(MockGateway::new());
        for _ in 0..5 {
            mock.push_place_result(Err(GatewayError::Connection("reset".to_string())));
        }

        let err = dispatcher(Arc::clone(&mock), fast_retry(2))
            .dispatch(&intent())
            .await
            .unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::Transient);
        assert_eq!(err.attempts, 3);
        assert_eq!(mock.orders().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let mock = Arc::new(MockGateway::new());
        mock.push_place_result(Err(GatewayError::RateLimited));

        let err = dispatcher(Arc::clone(&mock), fast_retry(0))
            .dispatch(&intent())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.attempts, 1);
        assert_eq!(mock.orders().len(), 1);
    }
}
