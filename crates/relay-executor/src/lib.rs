//! Signal execution for the relay.
//!
//! Runs each signal through fetch → reconcile → dispatch while holding the
//! signal's market slot, so signals for one market never interleave and
//! signals for different markets never wait on each other.
//!
//! # Key Components
//!
//! - [`MarketLocks`]: Lazily created per-market async mutexes
//! - [`OrderDispatcher`]: Order submission with bounded retry for transient failures
//! - [`RetryConfig`]: Backoff parameters for the dispatcher
//! - [`SignalExecutor`]: The full per-signal pipeline
//! - [`SignalOutcome`]: Dispatched order or reasoned no-op

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod serializer;

pub use dispatcher::{OrderDispatcher, RetryConfig};
pub use error::{DispatchError, DispatchErrorKind, ExecutorError, ExecutorResult};
pub use executor::{SignalExecutor, SignalOutcome};
pub use serializer::MarketLocks;
