//! Order ledger persistence for the signal relay.
//!
//! Keeps an auxiliary record of dispatched orders in a pretty-printed JSON
//! array file. The ledger is write-only from the relay's point of view: it
//! never feeds back into reconciliation.

pub mod error;
pub mod ledger;

pub use error::{PersistenceError, PersistenceResult};
pub use ledger::{JsonLedger, LedgerEntry};
