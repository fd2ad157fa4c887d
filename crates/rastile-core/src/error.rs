#![forbid(unsafe_code)]

//! Shared error vocabulary for tile stores and log backends.

use thiserror::Error;

use crate::log::{LogId, LogKind};

/// Errors surfaced by tile-store and log-backend implementations.
///
/// These are hard failures: the operation that triggered one did not take
/// effect. Truncated individual log entries are NOT reported here — the
/// replay engine tolerates and skips those (see `rastile-txn`).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no {kind:?} log with id {id:?}")]
    LogNotFound { kind: LogKind, id: LogId },

    #[error("log id space exhausted")]
    LogLimit,

    #[error("tile {index} out of range (store has {count})")]
    TileOutOfRange { index: u32, count: u32 },

    #[error("storage failure: {0}")]
    Storage(String),
}
