//! Exchange gateway boundary for the signal relay.
//!
//! The relay core depends only on the [`ExchangeGateway`] trait: query the
//! account's open positions and place an order. Everything about wire
//! formats, endpoints and credentials lives behind it.
//!
//! # Key Components
//!
//! - [`ExchangeGateway`]: dyn-compatible trait injected into the core
//! - [`HttpGateway`]: REST implementation (indexer positions + order endpoint)
//! - [`MockGateway`]: Recording test double with optional fill simulation
//! - [`GatewayError`]: Errors with transient/rejected classification

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod mock;
pub mod types;

pub use config::{Credentials, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BoxFuture, DynGateway, ExchangeGateway};
pub use http::HttpGateway;
pub use mock::{GatewayEvent, MockGateway};
pub use types::{Account, OrderAck, PlaceOrderRequest, PositionRecord, PositionStatus};
