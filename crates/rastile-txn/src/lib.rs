#![forbid(unsafe_code)]

//! Transactional core of the rastile raster store.
//!
//! # Role in rastile
//! `rastile-txn` turns a tiled pixel store and a log backend (both consumed
//! through the `rastile-core` capability traits) into a raster with a
//! persistent, session-spanning undo/redo history:
//!
//! - [`HistoryStack`]: dual owned stacks of history entries.
//! - [`codec`]: the fixed little-endian layout both stacks persist through.
//! - [`replay`](mod@replay): merges a recorded log back into the tiles,
//!   caching the open tile editor across consecutive same-tile entries.
//! - [`RasterStore`]: the `Idle`/`Recording` state machine that owns it
//!   all — transactions, lazy redo synthesis, bookmark-bounded restore on
//!   attach.
//!
//! # How it fits in the system
//! Editing code opens a transaction, writes runs through the store (each
//! write silently records the overwritten bytes into the active undo log),
//! and ends the transaction to push one history entry. Undo replays that
//! log backwards into the tiles — and, the first time, captures the forward
//! diff into a freshly recorded redo log. History survives process
//! restarts through the two persisted stack buffers.

pub mod codec;
pub mod error;
pub mod history;
pub mod replay;
pub mod store;

pub use codec::{CodecError, SENTINEL};
pub use error::{StoreError, TxnOutcome};
pub use history::{HistoryEntry, HistoryStack};
pub use replay::{ReplayStats, replay};
pub use store::RasterStore;
