#![forbid(unsafe_code)]

//! Error and outcome types for store orchestration.

use thiserror::Error;

use rastile_core::BackendError;

use crate::codec::CodecError;

/// Hard failures surfaced by [`RasterStore`](crate::RasterStore) operations.
///
/// A failed operation leaves both history stacks and the raster in their
/// pre-call state; the stacks are only mutated after the log operation that
/// backs the mutation has succeeded.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `start_transaction` while a transaction is already recording.
    #[error("a transaction is already recording")]
    AlreadyRecording,

    /// The log backend failed to create, read, or write.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A persisted history buffer failed to decode.
    #[error("history buffer corrupt: {0}")]
    Codec(#[from] CodecError),
}

/// Result of ending a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOutcome {
    /// The transaction recorded edits and was pushed onto the undo stack.
    Committed,
    /// The transaction recorded nothing; the log was discarded and the
    /// history stacks are untouched.
    Empty,
}
