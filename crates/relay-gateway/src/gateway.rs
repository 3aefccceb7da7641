//! Exchange gateway trait.
//!
//! Provides a trait-based abstraction over the exchange so the relay core
//! can be constructed with any implementation:
//! - [`crate::HttpGateway`] in production
//! - [`crate::MockGateway`] in tests

use std::pin::Pin;
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::types::{Account, OrderAck, PlaceOrderRequest, PositionRecord};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Operations the relay needs from an exchange.
///
/// Implementations own their network and auth state and must be safe to
/// call concurrently from many in-flight signals.
pub trait ExchangeGateway: Send + Sync {
    /// All positions currently reported for the account.
    ///
    /// May include non-open records; callers filter by status.
    fn get_open_positions<'a>(
        &'a self,
        account: &'a Account,
    ) -> BoxFuture<'a, GatewayResult<Vec<PositionRecord>>>;

    /// Submit an order.
    fn place_order<'a>(
        &'a self,
        account: &'a Account,
        request: PlaceOrderRequest,
    ) -> BoxFuture<'a, GatewayResult<OrderAck>>;

    /// Network the gateway is connected to (for logging).
    fn network(&self) -> &str;
}

/// Arc wrapper for ExchangeGateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;
