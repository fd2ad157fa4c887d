#![forbid(unsafe_code)]

//! Raster store orchestration: the transaction state machine.
//!
//! A [`RasterStore`] owns the tiled pixel storage, the log backend, and the
//! history stack, and drives them through a two-state machine:
//!
//! ```text
//!            start_transaction()
//!    Idle ─────────────────────────► Recording
//!      ▲                                │
//!      └────────────────────────────────┘
//!            end_transaction()
//! ```
//!
//! `undo`/`redo` are only legal while `Idle`; calling them while `Recording`
//! is a programming-contract violation — asserted in debug builds, a no-op
//! in release. `start_transaction` while `Recording` is the one misuse with
//! a real error value, [`StoreError::AlreadyRecording`].
//!
//! # History persistence
//!
//! `detach` encodes both stacks through the stack codec and hands the
//! buffers to the backend; `attach` decodes them back and then replays redo
//! entries from the top of the redo stack until the bookmarked entry is
//! reached (the bookmarked entry itself is not replayed), restoring the
//! visual state to the last externally-saved point while keeping everything
//! beyond it redo-able.

use tracing::{debug, trace};

use rastile_core::{EditLog, EditMode, LogBackend, LogKind, PixelTileStore, Rect, TileEditor};

use crate::codec;
use crate::error::{StoreError, TxnOutcome};
use crate::history::{HistoryEntry, HistoryStack};
use crate::replay::replay;

/// A tiled raster with a session-spanning undo/redo history.
pub struct RasterStore<S, B: LogBackend> {
    tiles: S,
    backend: B,
    history: HistoryStack,
    /// The log currently recording; `Some` iff a transaction is open.
    active: Option<B::Log>,
}

impl<S, B> RasterStore<S, B>
where
    S: PixelTileStore,
    B: LogBackend,
{
    /// Create a store with empty history.
    pub fn new(tiles: S, backend: B) -> Self {
        Self {
            tiles,
            backend,
            history: HistoryStack::new(),
            active: None,
        }
    }

    /// Attach to a backend, restoring persisted history.
    ///
    /// Missing buffers mean empty history. After decoding, redo entries are
    /// replayed from the top of the redo stack up to (not including) the
    /// bookmarked entry; without a bookmark nothing is replayed.
    pub fn attach(tiles: S, backend: B) -> Result<Self, StoreError> {
        let undo_list = match backend.get_buffer(LogKind::Undo)? {
            Some(bytes) => codec::decode_undo(&bytes)?,
            None => Vec::new(),
        };
        let redo_list = match backend.get_buffer(LogKind::Redo)? {
            Some(bytes) => codec::decode_redo(&bytes)?,
            None => Vec::new(),
        };
        let mut store = Self {
            tiles,
            backend,
            history: HistoryStack::from_parts(undo_list, redo_list),
            active: None,
        };
        debug!(
            undo_depth = store.history.undo_depth(),
            redo_depth = store.history.redo_depth(),
            "attached history"
        );
        store.restore_to_bookmark()?;
        Ok(store)
    }

    /// Persist history and dissolve the store into its collaborators.
    pub fn detach(mut self) -> Result<(S, B), StoreError> {
        debug_assert!(self.active.is_none(), "detach with open transaction");
        if let Some(log) = self.active.take() {
            self.backend.discard_log(LogKind::Undo, log.id());
        }
        self.backend
            .put_buffer(LogKind::Undo, &codec::encode_undo(&self.history))?;
        self.backend
            .put_buffer(LogKind::Redo, &codec::encode_redo(&self.history))?;
        debug!(
            undo_depth = self.history.undo_depth(),
            redo_depth = self.history.redo_depth(),
            "detached history"
        );
        Ok((self.tiles, self.backend))
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Open a transaction: edits from here on record into a fresh undo log.
    pub fn start_transaction(&mut self) -> Result<(), StoreError> {
        if self.active.is_some() {
            return Err(StoreError::AlreadyRecording);
        }
        let log = self.backend.create_log(LogKind::Undo)?;
        trace!(id = ?log.id(), "transaction started");
        self.active = Some(log);
        Ok(())
    }

    /// Close the open transaction.
    ///
    /// An empty transaction discards its log and leaves the stacks alone.
    /// A real one commits the log, discards the pending redo branch, and
    /// pushes a fresh undo-only history entry.
    pub fn end_transaction(&mut self) -> Result<TxnOutcome, StoreError> {
        let Some(mut log) = self.active.take() else {
            debug_assert!(false, "end_transaction while idle");
            return Ok(TxnOutcome::Empty);
        };
        if log.is_empty() {
            trace!(id = ?log.id(), "empty transaction discarded");
            self.backend.discard_log(LogKind::Undo, log.id());
            return Ok(TxnOutcome::Empty);
        }
        if let Err(e) = log.commit() {
            // Keep recording; the caller may retry the commit.
            self.active = Some(log);
            return Err(e.into());
        }
        let id = log.id();
        let backend = &self.backend;
        self.history
            .clear_redo(|kind, log_id| backend.discard_log(kind, log_id));
        self.history.push_undo(HistoryEntry::new(id));
        debug!(?id, undo_depth = self.history.undo_depth(), "committed");
        Ok(TxnOutcome::Committed)
    }

    /// Whether a transaction is currently recording.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Merge a rectangular run of packed pixels into the raster.
    ///
    /// While a transaction is recording, the overwritten bytes are captured
    /// into its undo log; outside a transaction the write is unrecorded and
    /// cannot be undone.
    pub fn write_run(
        &mut self,
        x: u64,
        y: u64,
        width: u32,
        height: u32,
        payload: &[u8],
    ) -> Result<(), StoreError> {
        let rect = Rect::new(x, y, width, height);
        let mut record: Option<&mut dyn EditLog> = match self.active.as_mut() {
            Some(log) => Some(log),
            None => None,
        };
        for tile in self.tiles.find_tiles(&rect) {
            let mut editor = self.tiles.open_editor(tile, EditMode::Write, None)?;
            let rec: Option<&mut dyn EditLog> = match record {
                Some(ref mut log) => Some(&mut **log),
                None => None,
            };
            editor.merge_run(x, y, width, height, payload, rec)?;
            drop(editor);
            self.tiles.notify_updated(tile);
        }
        Ok(())
    }

    // ── Undo / redo ─────────────────────────────────────────────────

    /// Roll back the most recent committed transaction.
    ///
    /// The first undo of an entry synthesizes and caches its redo log as a
    /// side effect of the rollback; later undos replay without recording.
    /// Returns `Ok(false)` when there is nothing to undo. On failure the
    /// entry is pushed back and both stacks are as before the call.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        if self.active.is_some() {
            debug_assert!(false, "undo during open transaction");
            return Ok(false);
        }
        let Some(mut entry) = self.history.pop_undo() else {
            return Ok(false);
        };
        match run_undo(&self.backend, &self.tiles, &mut entry) {
            Ok(()) => {
                self.history.push_redo(entry);
                Ok(true)
            }
            Err(e) => {
                self.history.push_undo(entry);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone transaction.
    ///
    /// Returns `Ok(false)` when there is nothing to redo. On failure the
    /// entry is pushed back and both stacks are as before the call.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        if self.active.is_some() {
            debug_assert!(false, "redo during open transaction");
            return Ok(false);
        }
        let Some(mut entry) = self.history.pop_redo() else {
            return Ok(false);
        };
        let Some(redo_id) = entry.redo else {
            debug_assert!(false, "redo stack entry without redo log");
            self.history.push_redo(entry);
            return Ok(false);
        };
        let result = self
            .backend
            .open_log(LogKind::Redo, redo_id)
            .and_then(|mut log| replay(&mut log, &self.tiles, None, None));
        match result {
            Ok(stats) => {
                trace!(?redo_id, merged = stats.merged, "redo replayed");
                // The bookmark marks a redo-stack position; it does not
                // survive the move to the undo side (the undo layout has no
                // slot for it).
                entry.saved_bookmark = false;
                self.history.push_undo(entry);
                Ok(true)
            }
            Err(e) => {
                self.history.push_redo(entry);
                Err(e.into())
            }
        }
    }

    // ── Bookmark / maintenance ──────────────────────────────────────

    /// Mark the current state as externally saved.
    ///
    /// Bookmarks the next-to-redo entry; no-op when the redo stack is
    /// empty.
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    /// Discard all history and every log it references.
    pub fn clear_history(&mut self) {
        debug_assert!(self.active.is_none(), "clear_history with open transaction");
        if let Some(log) = self.active.take() {
            self.backend.discard_log(LogKind::Undo, log.id());
        }
        let backend = &self.backend;
        self.history
            .clear_all(|kind, log_id| backend.discard_log(kind, log_id));
        self.backend.clear_recorded_data();
        debug!("history cleared");
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The tiled pixel storage.
    pub fn tiles(&self) -> &S {
        &self.tiles
    }

    /// The log backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The history stack (read-only).
    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Number of undoable transactions.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// Number of redoable transactions.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Replay redo entries until the bookmarked one is next-to-redo.
    ///
    /// The bookmarked entry itself is not replayed. Without a bookmark the
    /// decoded position already is the state to present, so nothing runs.
    fn restore_to_bookmark(&mut self) -> Result<(), StoreError> {
        if !self.history.redo_has_bookmark() {
            return Ok(());
        }
        let mut replayed = 0usize;
        while self.history.redo_depth() > 0 && !self.history.top_redo_has_bookmark() {
            if !self.redo()? {
                break;
            }
            replayed += 1;
        }
        debug!(replayed, "restored to saved bookmark");
        Ok(())
    }
}

/// Replay an entry's undo log, synthesizing the redo log on first undo.
fn run_undo<S, B>(
    backend: &B,
    tiles: &S,
    entry: &mut HistoryEntry,
) -> Result<(), StoreError>
where
    S: PixelTileStore,
    B: LogBackend,
{
    let mut undo_log = backend.open_log(LogKind::Undo, entry.undo)?;
    if entry.redo.is_some() {
        let stats = replay(&mut undo_log, tiles, None, None)?;
        trace!(undo = ?entry.undo, merged = stats.merged, "undo replayed (cached redo)");
    } else {
        let mut redo_log = backend.create_log(LogKind::Redo)?;
        let stats = replay(&mut undo_log, tiles, Some(&mut redo_log), None)?;
        redo_log.commit()?;
        entry.redo = Some(redo_log.id());
        trace!(
            undo = ?entry.undo,
            redo = ?entry.redo,
            merged = stats.merged,
            "undo replayed, redo log synthesized"
        );
    }
    Ok(())
}
