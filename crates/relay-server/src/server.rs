//! HTTP server implementation using axum.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use relay_core::RawSignal;
use relay_executor::SignalOutcome;
use relay_persistence::LedgerEntry;
use relay_telemetry::Metrics;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    market_slots: usize,
}

/// Create the axum router.
///
/// `/data` is kept as an alias of `/webhook` for alert templates that still
/// post to the old path.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/data", post(webhook))
        .route("/orders", get(list_orders))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello, world!"
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        market_slots: state.executor.slot_count(),
    })
}

/// Accept a signal.
///
/// The body is parsed here rather than through the `Json` extractor so
/// every malformed payload maps to 400.
async fn webhook(State(state): State<AppState>, body: Bytes) -> ServerResult<Json<SignalOutcome>> {
    let raw: RawSignal = serde_json::from_slice(&body).map_err(|e| {
        Metrics::signal_invalid();
        warn!(error = %e, "Malformed signal body");
        ServerError::InvalidSignal(format!("malformed JSON: {e}"))
    })?;

    let signal = raw.validate().map_err(|e| {
        Metrics::signal_invalid();
        warn!(error = %e, "Rejected signal");
        ServerError::InvalidSignal(e.to_string())
    })?;
    state.check_market(&signal.market)?;

    let outcome = state.executor.on_signal(signal).await?;
    Ok(Json(outcome))
}

async fn list_orders(State(state): State<AppState>) -> ServerResult<Json<Vec<LedgerEntry>>> {
    let ledger = state.executor.ledger().ok_or(ServerError::LedgerDisabled)?;
    Ok(Json(ledger.read_all().await?))
}

async fn metrics() -> ServerResult<impl IntoResponse> {
    let body = Metrics::gather()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Bind and serve until `shutdown` resolves.
pub async fn run_server<F>(state: AppState, config: &ServerConfig, shutdown: F) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Starting webhook server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Webhook server stopped");
    Ok(())
}
