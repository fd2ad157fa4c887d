#![forbid(unsafe_code)]

//! Capability traits for the tiled pixel storage.
//!
//! The transaction engine never owns pixels. It looks tiles up by spatial
//! extent, opens a scoped [`TileEditor`] per tile, and merges rectangular
//! runs through it. The editor is where inverse diffs are born: a merge that
//! is handed a recording log captures the bytes it is about to overwrite
//! into that log before writing, which is how undo logs are recorded during
//! editing and how redo logs are synthesized the first time an undo is
//! replayed.

use smallvec::SmallVec;

use crate::error::BackendError;
use crate::geometry::Rect;
use crate::log::EditLog;

/// Index of a tile within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

/// Tile editor acquisition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Read,
    Write,
}

/// A scoped editor over one tile's pixels.
pub trait TileEditor {
    /// Extent of the tile being edited, in world coordinates.
    fn extent(&self) -> Rect;

    /// Merge a rectangular run of packed pixels into the tile.
    ///
    /// `(x, y)` are world coordinates of the run's top-left corner; the run
    /// is clipped to the tile's extent, overwriting exactly the clipped
    /// sub-region. When `record_into` is supplied, the bytes being
    /// overwritten are captured into that log (as a clipped run of their
    /// own) before the write.
    fn merge_run(
        &mut self,
        x: u64,
        y: u64,
        width: u32,
        height: u32,
        payload: &[u8],
        record_into: Option<&mut dyn EditLog>,
    ) -> Result<(), BackendError>;
}

/// Tiled pixel storage, the unit-of-locking collaborator.
///
/// Mutual exclusion across stores sharing one backing canvas is advisory:
/// a caller that already holds the store's lock passes its guard into
/// [`open_editor`](PixelTileStore::open_editor); a caller that does not
/// (the replay engine, by default) takes [`advisory_lock`]
/// (PixelTileStore::advisory_lock) scoped to each tile edit.
pub trait PixelTileStore {
    /// Scoped editor borrowing this store.
    type Editor<'a>: TileEditor
    where
        Self: 'a;

    /// Scoped advisory lock guard; dropping it releases the lock.
    type Guard<'a>
    where
        Self: 'a;

    /// Tiles whose extents intersect `rect`, in storage order.
    fn find_tiles(&self, rect: &Rect) -> SmallVec<[TileId; 4]>;

    /// World extent of a tile.
    fn tile_extent(&self, tile: TileId) -> Rect;

    /// Acquire the store's advisory lock.
    fn advisory_lock(&self) -> Self::Guard<'_>;

    /// Open a scoped editor on `tile`.
    ///
    /// `lock` is the caller's advisory guard when it already holds one;
    /// `None` means the caller manages locking itself (or chose not to).
    fn open_editor<'a>(
        &'a self,
        tile: TileId,
        mode: EditMode,
        lock: Option<&Self::Guard<'a>>,
    ) -> Result<Self::Editor<'a>, BackendError>;

    /// Mark a tile dirty after its editor closed.
    fn notify_updated(&self, tile: TileId);

    /// Drop derived raster state (e.g. a representative-palette cache).
    ///
    /// Called once per replay, after the last merge, never per entry.
    fn invalidate_derived(&self);
}
