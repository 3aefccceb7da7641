//! REST implementation of the exchange gateway.
//!
//! Positions come from the indexer (`/v4/perpetualPositions`); orders are
//! posted to the configured order endpoint with API key headers.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Credentials, GatewayConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{BoxFuture, ExchangeGateway};
use crate::types::{Account, OrderAck, PlaceOrderRequest, PositionRecord, PositionsResponse};

const API_KEY_HEADER: &str = "DYDX-API-KEY";
const API_SECRET_HEADER: &str = "DYDX-API-SECRET";
const API_PASSPHRASE_HEADER: &str = "DYDX-PASSPHRASE";

/// Order body: the request plus the owning account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderSubmission<'a> {
    address: &'a str,
    subaccount_number: u32,
    #[serde(flatten)]
    order: &'a PlaceOrderRequest,
}

/// Indexer height response, used as a connectivity probe.
#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: String,
}

/// Gateway backed by the exchange REST APIs.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
    credentials: Credentials,
}

impl HttpGateway {
    /// Build the gateway without touching the network.
    pub fn new(config: GatewayConfig, credentials: Credentials) -> GatewayResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| GatewayError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Build the gateway and verify the indexer is reachable.
    pub async fn connect(config: GatewayConfig, credentials: Credentials) -> GatewayResult<Self> {
        let gateway = Self::new(config, credentials)?;

        info!(
            network = %gateway.config.network_name,
            chain_id = %gateway.config.chain_id,
            indexer = %gateway.config.indexer_rest_endpoint,
            validator = %gateway.config.validator_rest_endpoint,
            "Connecting to exchange"
        );

        let height = gateway.fetch_height().await?;
        info!(
            network = %gateway.config.network_name,
            height = %height,
            "Exchange indexer reachable"
        );

        Ok(gateway)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn indexer_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.indexer_rest_endpoint.trim_end_matches('/'),
            path
        )
    }

    async fn fetch_height(&self) -> GatewayResult<String> {
        let response = self.client.get(self.indexer_url("/v4/height")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let height: HeightResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse height: {e}")))?;
        Ok(height.height)
    }

    async fn fetch_positions(&self, account: &Account) -> GatewayResult<Vec<PositionRecord>> {
        debug!(account = %account, "Fetching open positions");

        let subaccount = account.subaccount.to_string();
        let response = self
            .client
            .get(self.indexer_url("/v4/perpetualPositions"))
            .query(&[
                ("address", account.address.as_str()),
                ("subaccountNumber", subaccount.as_str()),
                ("status", "OPEN"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let body: PositionsResponse = response.json().await.map_err(|e| {
            GatewayError::InvalidResponse(format!("Failed to parse positions: {e}"))
        })?;

        debug!(
            account = %account,
            positions = body.positions.len(),
            "Fetched positions"
        );
        Ok(body.positions)
    }

    async fn submit_order(
        &self,
        account: &Account,
        request: PlaceOrderRequest,
    ) -> GatewayResult<OrderAck> {
        info!(
            account = %account,
            market = %request.market,
            side = %request.side,
            size = %request.size,
            price = %request.price,
            reduce_only = request.reduce_only,
            client_id = %request.client_id,
            "Submitting order"
        );

        let submission = OrderSubmission {
            address: &account.address,
            subaccount_number: account.subaccount,
            order: &request,
        };

        let response = self
            .client
            .post(&self.config.order_endpoint)
            .header(API_KEY_HEADER, self.credentials.api_key.as_str())
            .header(API_SECRET_HEADER, self.credentials.api_secret.as_str())
            .header(API_PASSPHRASE_HEADER, self.credentials.passphrase.as_str())
            .json(&submission)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, body);
            warn!(market = %request.market, error = %err, "Order submission failed");
            return Err(err);
        }

        // 2xx: the order is accepted even when the body is unreadable.
        let body = response.bytes().await.unwrap_or_default();
        match serde_json::from_slice::<OrderAck>(&body) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!(
                    market = %request.market,
                    status = %status,
                    error = %e,
                    "Order accepted but ack unreadable; order may be live"
                );
                Ok(OrderAck::unconfirmed())
            }
        }
    }
}

/// Map a non-success HTTP status to a gateway error.
fn classify_status(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Auth(format!("HTTP {status}: {body}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GatewayError::Timeout(format!("HTTP {status}: {body}"))
        }
        s if s.is_server_error() => GatewayError::Unavailable {
            status: s.as_u16(),
            body,
        },
        _ => GatewayError::Rejected(format!("HTTP {status}: {body}")),
    }
}

impl ExchangeGateway for HttpGateway {
    fn get_open_positions<'a>(
        &'a self,
        account: &'a Account,
    ) -> BoxFuture<'a, GatewayResult<Vec<PositionRecord>>> {
        Box::pin(self.fetch_positions(account))
    }

    fn place_order<'a>(
        &'a self,
        account: &'a Account,
        request: PlaceOrderRequest,
    ) -> BoxFuture<'a, GatewayResult<OrderAck>> {
        Box::pin(self.submit_order(account, request))
    }

    fn network(&self) -> &str {
        &self.config.network_name
    }
}
