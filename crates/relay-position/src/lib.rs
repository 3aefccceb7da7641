//! Position state and reconciliation for the signal relay.
//!
//! Fetches the account's current exposure in a market and decides the one
//! order (if any) that moves it to where the latest signal wants it.
//!
//! # Key Components
//!
//! - [`SnapshotFetcher`]: Queries the exchange gateway for a market's open position
//! - [`PositionSnapshot`]: Exchange-reported position state at fetch time
//! - [`reconcile`]: Pure decision from signal + snapshot to an [`relay_core::OrderIntent`]
//! - [`NoOpReason`]: Why a signal produced no order

pub mod error;
pub mod reconcile;
pub mod snapshot;

pub use error::{PositionError, PositionResult};
pub use reconcile::{reconcile, NoOpReason};
pub use snapshot::{PositionSnapshot, SnapshotFetcher};
