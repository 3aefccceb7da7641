//! Core domain types for the signal relay.
//!
//! This crate provides fundamental types used throughout the relay:
//! - `Market`: Validated exchange market symbol (e.g. "SOL-USD")
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Signal`, `RawSignal`: Inbound directional trading instruction
//! - `OrderIntent`: The single order a reconciliation pass decides to submit
//! - `OrderSide`, `OrderType`, `ClientOrderId`: Trading enums and identifiers

pub mod decimal;
pub mod error;
pub mod intent;
pub mod market;
pub mod order;
pub mod signal;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use intent::OrderIntent;
pub use market::Market;
pub use order::{ClientOrderId, OrderSide, OrderType};
pub use signal::{DesiredPosition, RawSignal, Signal};
