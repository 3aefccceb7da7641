//! Shared handler state.

use std::collections::HashSet;
use std::sync::Arc;

use relay_core::Market;
use relay_executor::SignalExecutor;

use crate::error::{ServerError, ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<SignalExecutor>,
    /// Empty = accept any market.
    allowed_markets: Arc<HashSet<Market>>,
}

impl AppState {
    pub fn new(executor: Arc<SignalExecutor>) -> Self {
        Self {
            executor,
            allowed_markets: Arc::new(HashSet::new()),
        }
    }

    /// Restrict accepted signals to `markets`.
    pub fn with_allowed_markets(mut self, markets: impl IntoIterator<Item = Market>) -> Self {
        self.allowed_markets = Arc::new(markets.into_iter().collect());
        self
    }

    pub fn check_market(&self, market: &Market) -> ServerResult<()> {
        if self.allowed_markets.is_empty() || self.allowed_markets.contains(market) {
            Ok(())
        } else {
            Err(ServerError::MarketNotAllowed(market.to_string()))
        }
    }
}
