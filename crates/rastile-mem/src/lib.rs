#![forbid(unsafe_code)]

//! In-memory reference collaborators for the rastile transactional raster
//! store.
//!
//! # Role in rastile
//! The transaction engine in `rastile-txn` is generic over two external
//! collaborators: the tiled pixel storage and the edit-log backend. This
//! crate ships the in-memory pair:
//!
//! - [`MemTileStore`]: a bounded canvas of row-major tiles with clipped run
//!   merges, inverse-run capture, update notifications, and a store-wide
//!   advisory lock.
//! - [`MemLogBackend`]: log storage addressed by `(kind, id)` with per-kind
//!   persisted buffers, plus the observation and fault-injection hooks the
//!   transaction tests lean on (creation spies, payload truncation,
//!   injected create failures).
//!
//! Both are single-threaded by design, matching the one-store-one-thread
//! scheduling model of the engine.

pub mod log_backend;
pub mod tile_store;

pub use log_backend::{MemEditLog, MemLogBackend};
pub use tile_store::{MemTileEditor, MemTileStore};
