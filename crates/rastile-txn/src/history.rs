#![forbid(unsafe_code)]

//! History stack for raster undo/redo transactions.
//!
//! This module provides the [`HistoryStack`]: dual owned stacks of
//! [`HistoryEntry`] values. Entries move between the two stacks as
//! transactions are undone and redone; they are never duplicated or aliased.
//!
//! # Invariants
//!
//! 1. Every entry on the redo stack has `redo = Some(..)` — only
//!    already-undone entries live there, and the first undo synthesizes the
//!    redo log.
//! 2. At most one entry across both stacks carries the saved bookmark.
//! 3. Clearing a stack releases every log id its entries reference through
//!    the caller's release callback — a log is never silently leaked.
//!
//! ```text
//! commit(T4)                      undo() x2
//! ┌─────────────────────────┐     ┌─────────────────────────┐
//! │ undo: [T1, T2, T3, T4]  │     │ undo: [T1, T2]          │
//! │ redo: []                │ ──► │ redo: [T4, T3]          │
//! └─────────────────────────┘     └─────────────────────────┘
//!
//! commit(T5)  <-- discards the pending redo branch
//! ┌─────────────────────────┐
//! │ undo: [T1, T2, T5]      │
//! │ redo: []                │
//! └─────────────────────────┘
//! ```

use rastile_core::{LogId, LogKind};

/// One committed transaction in the history.
///
/// `undo` always names the log that rolls the transaction back. `redo` is
/// absent until the entry is undone for the first time, at which point the
/// forward diff is synthesized and cached here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Log that rolls the raster back to the state before this transaction.
    pub undo: LogId,
    /// Log that re-applies the transaction; lazily recorded on first undo.
    pub redo: Option<LogId>,
    /// Marks the last externally-confirmed saved state.
    pub saved_bookmark: bool,
}

impl HistoryEntry {
    /// Entry for a freshly committed transaction (undo-only, unbookmarked).
    #[must_use]
    pub fn new(undo: LogId) -> Self {
        Self {
            undo,
            redo: None,
            saved_bookmark: false,
        }
    }

    /// Pass every log id this entry references to `release`.
    fn release_logs(&self, release: &mut impl FnMut(LogKind, LogId)) {
        release(LogKind::Undo, self.undo);
        if let Some(redo) = self.redo {
            release(LogKind::Redo, redo);
        }
    }
}

/// Dual undo/redo stacks of owned history entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStack {
    /// Entries available for undo (newest at the back).
    undo_list: Vec<HistoryEntry>,
    /// Entries available for redo (next-to-redo at the back).
    redo_list: Vec<HistoryEntry>,
}

impl HistoryStack {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from decoded stacks (bottom-to-top order).
    #[must_use]
    pub fn from_parts(undo_list: Vec<HistoryEntry>, redo_list: Vec<HistoryEntry>) -> Self {
        debug_assert!(redo_list.iter().all(|e| e.redo.is_some()));
        Self {
            undo_list,
            redo_list,
        }
    }

    /// Push an entry onto the undo stack.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_list.push(entry);
    }

    /// Push an entry onto the redo stack.
    ///
    /// Only undone entries belong here, so `entry.redo` must be populated.
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        debug_assert!(entry.redo.is_some(), "redo stack entry without redo log");
        self.redo_list.push(entry);
    }

    /// Pop the most recent undoable entry.
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo_list.pop()
    }

    /// Pop the next redoable entry.
    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo_list.pop()
    }

    /// Number of undoable entries.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_list.len()
    }

    /// Number of redoable entries.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_list.len()
    }

    /// Undo entries, bottom of the stack first.
    #[must_use]
    pub fn undo_entries(&self) -> &[HistoryEntry] {
        &self.undo_list
    }

    /// Redo entries, bottom of the stack first.
    #[must_use]
    pub fn redo_entries(&self) -> &[HistoryEntry] {
        &self.redo_list
    }

    /// Whether the next-to-redo entry carries the saved bookmark.
    #[must_use]
    pub fn top_redo_has_bookmark(&self) -> bool {
        self.redo_list.last().is_some_and(|e| e.saved_bookmark)
    }

    /// Whether any redo entry carries the saved bookmark.
    #[must_use]
    pub fn redo_has_bookmark(&self) -> bool {
        self.redo_list.iter().any(|e| e.saved_bookmark)
    }

    /// Bookmark the next-to-redo entry as the last saved state.
    ///
    /// Clears any existing bookmark first so at most one entry across both
    /// stacks carries it. No-op when the redo stack is empty.
    pub fn mark_saved(&mut self) {
        for entry in self.undo_list.iter_mut().chain(self.redo_list.iter_mut()) {
            entry.saved_bookmark = false;
        }
        if let Some(top) = self.redo_list.last_mut() {
            top.saved_bookmark = true;
        }
    }

    /// Discard the pending redo branch, releasing its logs.
    pub fn clear_redo(&mut self, mut release: impl FnMut(LogKind, LogId)) {
        for entry in self.redo_list.drain(..) {
            entry.release_logs(&mut release);
        }
    }

    /// Discard all history, releasing every referenced log.
    pub fn clear_all(&mut self, mut release: impl FnMut(LogKind, LogId)) {
        for entry in self.undo_list.drain(..).chain(self.redo_list.drain(..)) {
            entry.release_logs(&mut release);
        }
    }
}
