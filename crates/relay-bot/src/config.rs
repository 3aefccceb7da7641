//! Application configuration.
//!
//! Loaded from a TOML file. Every section and field has a default so a
//! minimal file only needs the exchange wallet address. API secrets are
//! never read from the file; see [`relay_gateway::Credentials::from_env`].

use std::time::Duration;

use relay_core::Market;
use relay_executor::RetryConfig;
use relay_gateway::GatewayConfig;
use relay_server::ServerConfig;
use relay_telemetry::logging::DEFAULT_LOG_FILTER;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub exchange: GatewayConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Order dispatch retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Retries after a transient failure. 0 = single attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    2_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl DispatchConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

/// Auxiliary JSON order ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

fn default_ledger_path() -> String {
    "data/db.json".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_ledger_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default log filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Checks that do not need the network.
    pub fn validate(&self) -> AppResult<()> {
        self.exchange.validate()?;
        if self.allowed_markets()?.is_empty() {
            return Err(AppError::Config(
                "exchange.markets must list at least one market".to_string(),
            ));
        }

        let dispatch = &self.dispatch;
        if !dispatch.backoff_multiplier.is_finite() || dispatch.backoff_multiplier < 1.0 {
            return Err(AppError::Config(
                "dispatch.backoff_multiplier must be >= 1.0".to_string(),
            ));
        }
        if dispatch.max_delay_ms < dispatch.base_delay_ms {
            return Err(AppError::Config(
                "dispatch.max_delay_ms must be >= dispatch.base_delay_ms".to_string(),
            ));
        }
        if self.ledger.enabled && self.ledger.path.trim().is_empty() {
            return Err(AppError::Config(
                "ledger.path is required when the ledger is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed market allow list.
    pub fn allowed_markets(&self) -> AppResult<Vec<Market>> {
        self.exchange
            .markets
            .iter()
            .map(|m| Market::parse(m).map_err(AppError::from))
            .collect()
    }
}
