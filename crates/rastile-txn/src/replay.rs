#![forbid(unsafe_code)]

//! Replay engine: merges an edit log back into the tiled pixel store.
//!
//! Entries are applied strictly in recorded order — later entries may
//! overwrite regions written by earlier ones in the same log. The engine
//! keeps the most recently opened tile editor cached so that consecutive
//! entries hitting the same tile skip the spatial lookup; the cached tile is
//! dirty-notified and closed only when an entry falls outside it (or the log
//! ends).
//!
//! Threading `record_into` through every merge is what makes lazy redo work:
//! while an undo log is being replayed for the first time, the tile editors
//! capture the bytes being overwritten into the supplied log, synthesizing
//! the forward diff as a side effect of the rollback.
//!
//! Truncated entries (backend returned fewer payload bytes than the record
//! declares) are skipped one at a time and replay continues — a deliberate
//! data-tolerance policy, not an error.

use tracing::{debug, trace};

use rastile_core::{BackendError, EditLog, EditMode, PixelTileStore, Rect, TileEditor, TileId};

/// Counters from one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Entries merged into the store.
    pub merged: usize,
    /// Truncated entries skipped.
    pub skipped: usize,
}

/// The currently-open tile, kept across consecutive same-tile entries.
///
/// Field order matters: the editor must drop before the scoped guard.
struct OpenTile<'s, S: PixelTileStore + 's> {
    tile: TileId,
    extent: Rect,
    editor: S::Editor<'s>,
    scoped: Option<S::Guard<'s>>,
}

/// Replay `log` into `store`, entry by entry, in recorded order.
///
/// `record_into` receives the inverse run of every merge (lazy-redo
/// synthesis); `caller_lock` is the caller's advisory guard when it already
/// holds the store's lock. Without one, the engine takes the store's
/// advisory lock scoped to each tile editing span — one tile lock at a
/// time, released before the next acquisition.
///
/// An empty log is a no-op. Derived raster state is invalidated exactly
/// once, after the last merge, and only if anything merged.
pub fn replay<'s, S, L>(
    log: &mut L,
    store: &'s S,
    mut record_into: Option<&mut dyn EditLog>,
    caller_lock: Option<&S::Guard<'s>>,
) -> Result<ReplayStats, BackendError>
where
    S: PixelTileStore,
    L: EditLog + ?Sized,
{
    let mut stats = ReplayStats::default();
    let mut open: Option<OpenTile<'s, S>> = None;

    while let Some(entry) = log.pop_entry()? {
        if entry.is_truncated() {
            debug!(
                declared = entry.declared_len,
                actual = entry.payload.len(),
                "skipping truncated log entry"
            );
            stats.skipped += 1;
            continue;
        }
        let rect = entry.rect();
        if rect.is_empty() {
            continue;
        }

        // Fast path: the cached tile fully contains the run.
        if let Some(o) = open.as_mut() {
            if o.extent.contains_rect(&rect) {
                let rec: Option<&mut dyn EditLog> = match record_into {
                    Some(ref mut log) => Some(&mut **log),
                    None => None,
                };
                o.editor.merge_run(
                    entry.x,
                    entry.y,
                    entry.width,
                    entry.height,
                    &entry.payload,
                    rec,
                )?;
                stats.merged += 1;
                continue;
            }
        }

        close_open(store, &mut open);

        let tiles = store.find_tiles(&rect);
        trace!(?rect, tiles = tiles.len(), "replay entry crosses tile cache");
        let mut merged_any = false;
        for (i, &tile) in tiles.iter().enumerate() {
            let scoped = if caller_lock.is_none() {
                Some(store.advisory_lock())
            } else {
                None
            };
            let mut editor =
                store.open_editor(tile, EditMode::Write, caller_lock.or(scoped.as_ref()))?;
            let rec: Option<&mut dyn EditLog> = match record_into {
                Some(ref mut log) => Some(&mut **log),
                None => None,
            };
            editor.merge_run(
                entry.x,
                entry.y,
                entry.width,
                entry.height,
                &entry.payload,
                rec,
            )?;
            merged_any = true;
            if i + 1 == tiles.len() {
                open = Some(OpenTile {
                    tile,
                    extent: store.tile_extent(tile),
                    editor,
                    scoped,
                });
            } else {
                drop(editor);
                drop(scoped);
                store.notify_updated(tile);
            }
        }
        if merged_any {
            stats.merged += 1;
        }
    }

    close_open(store, &mut open);
    if stats.merged > 0 {
        store.invalidate_derived();
    }
    trace!(merged = stats.merged, skipped = stats.skipped, "replay done");
    Ok(stats)
}

/// Dirty-notify and close the cached tile, releasing its scoped lock.
fn close_open<'s, S: PixelTileStore>(store: &'s S, open: &mut Option<OpenTile<'s, S>>) {
    if let Some(o) = open.take() {
        store.notify_updated(o.tile);
        drop(o.editor);
        drop(o.scoped);
    }
}
