//! Executor error types.

use std::fmt;

use relay_position::PositionError;
use serde::Serialize;
use thiserror::Error;

/// Failure class of an order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchErrorKind {
    /// Timeout, connection loss, rate limit or 5xx. Safe to resend.
    Transient,
    /// Definitive refusal. Never resent.
    Rejected,
}

impl DispatchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DispatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind} dispatch failure after {attempts} attempt(s): {message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub attempts: u32,
    pub message: String,
}

impl DispatchError {
    pub fn is_transient(&self) -> bool {
        self.kind == DispatchErrorKind::Transient
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Snapshot fetch failed: {0}")]
    SnapshotFetchFailed(#[from] PositionError),

    #[error("Dispatch failed: {0}")]
    DispatchFailed(#[from] DispatchError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
