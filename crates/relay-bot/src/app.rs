//! Main application orchestration.
//!
//! Builds the gateway, executor, optional ledger and HTTP state from the
//! configuration, then serves webhooks until Ctrl-C.

use std::sync::Arc;

use axum::Router;
use relay_core::ClientOrderId;
use relay_executor::SignalExecutor;
use relay_gateway::{Credentials, DynGateway, HttpGateway};
use relay_persistence::JsonLedger;
use relay_server::AppState;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    state: AppState,
}

/// Install the global log subscriber from the telemetry config.
pub fn init_logging(config: &AppConfig) -> AppResult<()> {
    relay_telemetry::init_logging(&config.telemetry.log_level)?;
    Ok(())
}

impl Application {
    /// Wire the application around an already constructed gateway.
    pub fn new(config: AppConfig, gateway: DynGateway) -> AppResult<Self> {
        config.validate()?;

        let account = config.exchange.account();
        let client_id = ClientOrderId::new(config.exchange.client_id);
        let retry = config.dispatch.retry_config();

        info!(
            network = %gateway.network(),
            account = %account,
            client_id = %client_id,
            max_retries = retry.max_retries,
            "Initializing signal executor"
        );

        let mut executor = SignalExecutor::new(gateway, account, client_id, retry);
        if config.ledger.enabled {
            info!(path = %config.ledger.path, "Order ledger enabled");
            executor = executor.with_ledger(Arc::new(JsonLedger::new(&config.ledger.path)));
        }

        let markets = config.allowed_markets()?;
        info!(markets = ?markets, "Market allow list active");
        let state = AppState::new(Arc::new(executor)).with_allowed_markets(markets);

        Ok(Self { config, state })
    }

    /// Load credentials from the environment, connect to the exchange and
    /// wire the application.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let credentials = Credentials::from_env()?;
        let gateway = HttpGateway::connect(config.exchange.clone(), credentials).await?;
        Self::new(config, Arc::new(gateway))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router over the configured state.
    pub fn router(&self) -> Router {
        relay_server::create_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    warn!(error = %e, "Cannot listen for Ctrl-C; running until killed");
                    std::future::pending::<()>().await;
                }
            }
        };
        relay_server::run_server(self.state, &self.config.server, shutdown).await?;
        Ok(())
    }
}
