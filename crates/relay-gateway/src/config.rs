//! Exchange connection configuration and credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{GatewayError, GatewayResult};
use crate::types::Account;

/// Environment variable holding the exchange API key.
pub const API_KEY_ENV: &str = "RELAY_API_KEY";
/// Environment variable holding the exchange API secret.
pub const API_SECRET_ENV: &str = "RELAY_API_SECRET";
/// Environment variable holding the exchange API passphrase.
pub const API_PASSPHRASE_ENV: &str = "RELAY_API_PASSPHRASE";

/// Exchange network configuration.
///
/// Mirrors the per-environment (testnet / mainnet) config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Network name (e.g. "testnet", "mainnet").
    #[serde(default = "default_network_name")]
    pub network_name: String,
    /// Chain id (informational, logged at connect).
    #[serde(default)]
    pub chain_id: String,
    /// Indexer REST endpoint used for position queries.
    #[serde(default = "default_indexer_rest_endpoint")]
    pub indexer_rest_endpoint: String,
    /// Indexer websocket endpoint (informational).
    #[serde(default)]
    pub indexer_websocket_endpoint: String,
    /// Validator REST endpoint (informational).
    #[serde(default)]
    pub validator_rest_endpoint: String,
    /// Order submission endpoint.
    #[serde(default = "default_order_endpoint")]
    pub order_endpoint: String,
    /// Wallet address owning the trading subaccount.
    #[serde(default)]
    pub wallet_address: String,
    /// Subaccount number.
    #[serde(default)]
    pub sub_account: u32,
    /// Client order id attached to every order from this deployment.
    #[serde(default)]
    pub client_id: u32,
    /// Per-request timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Tradable markets. Signals for any other symbol are refused.
    #[serde(default)]
    pub markets: Vec<String>,
}

fn default_network_name() -> String {
    "testnet".to_string()
}

fn default_indexer_rest_endpoint() -> String {
    "https://indexer.v4testnet.dydx.exchange".to_string()
}

fn default_order_endpoint() -> String {
    "http://localhost:8080/orders".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network_name: default_network_name(),
            chain_id: String::new(),
            indexer_rest_endpoint: default_indexer_rest_endpoint(),
            indexer_websocket_endpoint: String::new(),
            validator_rest_endpoint: String::new(),
            order_endpoint: default_order_endpoint(),
            wallet_address: String::new(),
            sub_account: 0,
            client_id: 0,
            request_timeout_ms: default_request_timeout_ms(),
            markets: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Trading account described by this config.
    pub fn account(&self) -> Account {
        Account::new(self.wallet_address.clone(), self.sub_account)
    }

    /// Basic sanity checks before connecting.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.wallet_address.trim().is_empty() {
            return Err(GatewayError::Config("wallet_address is required".to_string()));
        }
        if self.indexer_rest_endpoint.trim().is_empty() {
            return Err(GatewayError::Config(
                "indexer_rest_endpoint is required".to_string(),
            ));
        }
        if self.order_endpoint.trim().is_empty() {
            return Err(GatewayError::Config("order_endpoint is required".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(GatewayError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// API credentials for the order endpoint.
///
/// Values are wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: Zeroizing<String>,
    pub api_secret: Zeroizing<String>,
    pub passphrase: Zeroizing<String>,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.into()),
            api_secret: Zeroizing::new(api_secret.into()),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }

    /// Load credentials from `RELAY_API_KEY`, `RELAY_API_SECRET` and
    /// `RELAY_API_PASSPHRASE`.
    pub fn from_env() -> GatewayResult<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| GatewayError::Config(format!("environment variable {name} not set")))
        };
        Ok(Self::new(
            read(API_KEY_ENV)?,
            read(API_SECRET_ENV)?,
            read(API_PASSPHRASE_ENV)?,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
