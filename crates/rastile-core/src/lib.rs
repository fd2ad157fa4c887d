#![forbid(unsafe_code)]

//! Core vocabulary for the rastile transactional raster store.
//!
//! # Role in rastile
//! `rastile-core` is the leaf crate every other rastile crate builds on. It
//! defines the pixel-space geometry, the value records that flow through edit
//! logs, and the capability traits behind which the two external
//! collaborators live:
//!
//! - [`PixelTileStore`] / [`TileEditor`]: the tiled pixel storage. The
//!   transaction engine never touches pixels directly; it opens scoped
//!   editors on tiles and merges rectangular runs through them.
//! - [`LogBackend`] / [`EditLog`]: the persistence backend that owns edit
//!   logs by [`LogId`] and the two per-kind history buffers.
//!
//! Concrete implementations live elsewhere (`rastile-mem` ships the
//! in-memory reference pair); the transaction engine in `rastile-txn` is
//! generic over these traits.

pub mod error;
pub mod geometry;
pub mod log;
pub mod tile;

pub use error::BackendError;
pub use geometry::Rect;
pub use log::{EditEntry, EditLog, LogBackend, LogId, LogKind};
pub use tile::{EditMode, PixelTileStore, TileEditor, TileId};
