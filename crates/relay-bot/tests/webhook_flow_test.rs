//! End-to-end webhook flow tests.
//!
//! Drives the full router built by `Application` against a mock exchange
//! that nets fills, so each signal sees the position left by the previous.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use relay_bot::{AppConfig, Application};
use relay_gateway::{DynGateway, GatewayError, GatewayEvent, MockGateway};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn config(ledger_dir: Option<&TempDir>) -> AppConfig {
    let mut config = AppConfig::default();
    config.exchange.wallet_address = "dydx1integration".to_string();
    config.exchange.client_id = 5;
    config.exchange.markets = vec!["SOL-USD".to_string()];
    config.dispatch.max_retries = 1;
    config.dispatch.base_delay_ms = 1;
    config.dispatch.max_delay_ms = 2;
    if let Some(dir) = ledger_dir {
        config.ledger.enabled = true;
        config.ledger.path = dir.path().join("db.json").display().to_string();
    }
    config
}

fn router(mock: &Arc<MockGateway>, config: AppConfig) -> Router {
    Application::new(config, Arc::clone(mock) as DynGateway)
        .unwrap()
        .router()
}

fn signal(position: &str, side: &str, size: &str) -> Request<Body> {
    signal_for("SOL-USD", position, side, size)
}

fn signal_for(market: &str, position: &str, side: &str, size: &str) -> Request<Body> {
    let body = format!(
        r#"{{"market":"{market}","position":"{position}","side":"{side}","price":"100","size":"{size}"}}"#
    );
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Open long, reverse to short, then flatten.
#[tokio::test]
async fn test_open_reverse_flatten() {
    let mock = Arc::new(MockGateway::with_fills());
    let router = router(&mock, config(None));

    let (status, body) = send(&router, signal("long", "buy", "5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "dispatched");
    assert_eq!(body["intent"]["size"], "5");
    assert_eq!(body["intent"]["reduce_only"], false);

    let (status, body) = send(&router, signal("short", "sell", "3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"]["side"], "sell");
    assert_eq!(body["intent"]["size"], "8");

    let (status, body) = send(&router, signal("flat", "buy", "3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"]["side"], "buy");
    assert_eq!(body["intent"]["size"], "3");
    assert_eq!(body["intent"]["reduce_only"], true);

    assert!(mock.positions().is_empty());
    let orders = mock.orders();
    assert_eq!(orders.len(), 3);
    assert!(orders.iter().all(|o| o.client_id.value() == 5));
}

/// Flat with nothing open never reaches order placement.
#[tokio::test]
async fn test_flat_with_no_position_is_noop() {
    let mock = Arc::new(MockGateway::with_fills());
    let router = router(&mock, config(None));

    let (status, body) = send(&router, signal("flat", "sell", "5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_action");
    assert_eq!(body["reason"], "nothing_to_close");
    assert!(mock.orders().is_empty());
    assert!(!mock
        .events()
        .iter()
        .any(|e| matches!(e, GatewayEvent::PlaceStarted(_))));
}

/// Symbol casing does not split a market: a lower-case flat closes the
/// upper-case position under the same lock slot.
#[tokio::test]
async fn test_market_symbol_case_is_normalized() {
    let mock = Arc::new(MockGateway::with_fills());
    let router = router(&mock, config(None));

    let (status, _) = send(&router, signal("long", "buy", "5")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, signal_for("sol-usd", "flat", "sell", "5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "dispatched");
    assert_eq!(body["intent"]["market"], "SOL-USD");
    assert_eq!(body["intent"]["reduce_only"], true);
    assert!(mock.positions().is_empty());

    let (_, health) = send(
        &router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["market_slots"], 1);
}

/// Markets outside the configured list never reach the exchange.
#[tokio::test]
async fn test_unlisted_market_is_refused() {
    let mock = Arc::new(MockGateway::with_fills());
    let router = router(&mock, config(None));

    let (status, body) = send(&router, signal_for("DOGE-USD", "long", "buy", "1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(mock.fetch_calls(), 0);
}

/// A transient failure is retried and the signal still succeeds.
#[tokio::test]
async fn test_transient_failure_recovers() {
    let mock = Arc::new(MockGateway::with_fills());
    mock.push_place_result(Err(GatewayError::Unavailable {
        status: 503,
        body: "maintenance".to_string(),
    }));
    let router = router(&mock, config(None));

    let (status, body) = send(&router, signal("long", "buy", "2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "dispatched");
    assert_eq!(mock.orders().len(), 2);
}

/// Concurrent signals on one market are applied one after the other.
#[tokio::test]
async fn test_concurrent_same_market_signals_are_serialized() {
    let mock = Arc::new(MockGateway::with_fills());
    mock.set_latency(std::time::Duration::from_millis(10));
    let router = router(&mock, config(None));

    let (first, second) = tokio::join!(
        send(&router, signal("long", "buy", "5")),
        send(&router, signal("short", "sell", "3")),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);

    // Whichever ran second saw the first's fill: one order reverses it.
    let sizes: Vec<String> = mock.orders().iter().map(|o| o.size.to_string()).collect();
    assert!(
        sizes == ["5", "8"] || sizes == ["3", "8"],
        "unexpected order sizes {sizes:?}"
    );
}

/// Dispatched orders land in the ledger and are listed on /orders.
#[tokio::test]
async fn test_ledger_records_dispatches() {
    let dir = TempDir::new().unwrap();
    let mock = Arc::new(MockGateway::with_fills());
    let router = router(&mock, config(Some(&dir)));

    send(&router, signal("long", "buy", "5")).await;
    send(&router, signal("flat", "sell", "5")).await;

    let (status, body) = send(
        &router,
        Request::builder().uri("/orders").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["position"], "long");
    assert_eq!(entries[1]["position"], "flat");
    assert_eq!(entries[1]["reduceOnly"], true);
}
