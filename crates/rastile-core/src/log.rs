#![forbid(unsafe_code)]

//! Edit logs: ordered sequences of rectangular pixel-run diffs.
//!
//! A transaction records every touched rectangle into an [`EditLog`] as a
//! side effect of writing through a tile editor. Once committed, the log is
//! owned by the [`LogBackend`] and addressed by its [`LogId`]; the store
//! keeps only the id. Replaying a log back into the tiles is the job of the
//! replay engine in `rastile-txn`.

use crate::error::BackendError;
use crate::geometry::Rect;

/// Opaque, backend-assigned identifier of a committed edit log.
///
/// The all-ones value is reserved as the persisted-format sentinel for
/// "no log recorded" and is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogId(pub u32);

impl LogId {
    /// Raw wire value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Which side of history a log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Rolls the raster back to the state before its transaction.
    Undo,
    /// Re-applies a transaction that was undone.
    Redo,
}

/// One rectangular run of packed pixel data.
///
/// `payload` holds row-major packed rows covering the full `width x height`
/// rectangle. `declared_len` is the byte length the backend recorded for the
/// run; a shorter `payload` marks a truncated record, which replay skips
/// rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    /// World X of the run's top-left corner.
    pub x: u64,
    /// World Y of the run's top-left corner.
    pub y: u64,
    /// Run width in pixels.
    pub width: u32,
    /// Run height in pixels.
    pub height: u32,
    /// Byte length the backend recorded for this run.
    pub declared_len: usize,
    /// Packed pixel bytes actually read back.
    pub payload: Vec<u8>,
}

impl EditEntry {
    /// Create an entry whose declared length matches its payload.
    #[must_use]
    pub fn new(x: u64, y: u64, width: u32, height: u32, payload: Vec<u8>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            declared_len: payload.len(),
            payload,
        }
    }

    /// World rectangle covered by this run.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Whether the backend returned fewer bytes than it declared.
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.declared_len
    }
}

/// An ordered, append-only sequence of [`EditEntry`]s.
///
/// Reading is sequential and consuming per handle: `pop_entry` advances a
/// cursor owned by this handle, so re-opening the log by id yields a fresh
/// pass over the same entries.
pub trait EditLog {
    /// Append an entry while the log is being recorded.
    fn push_entry(&mut self, entry: EditEntry);

    /// Pop the next entry, or `None` when the log is exhausted.
    fn pop_entry(&mut self) -> Result<Option<EditEntry>, BackendError>;

    /// Whether the log has no entries left to read.
    fn is_empty(&self) -> bool;

    /// Commit the recorded entries to the backend.
    fn commit(&mut self) -> Result<(), BackendError>;

    /// Backend-assigned identifier.
    fn id(&self) -> LogId;

    /// Drop all recorded entries from this log.
    fn clear(&mut self);
}

/// The persistence backend that owns edit logs and the history buffers.
pub trait LogBackend {
    /// Concrete log handle type.
    type Log: EditLog;

    /// Create a new, empty log for recording.
    fn create_log(&self, kind: LogKind) -> Result<Self::Log, BackendError>;

    /// Open a committed log with a fresh read cursor.
    fn open_log(&self, kind: LogKind, id: LogId) -> Result<Self::Log, BackendError>;

    /// Discard a committed log; its id may be reused.
    ///
    /// Discarding an unknown id is a no-op — clearing history must be able
    /// to release ids whose logs already vanished.
    fn discard_log(&self, kind: LogKind, id: LogId);

    /// Persist the encoded history buffer for `kind`.
    fn put_buffer(&self, kind: LogKind, bytes: &[u8]) -> Result<(), BackendError>;

    /// Read back the persisted history buffer for `kind`, if any.
    fn get_buffer(&self, kind: LogKind) -> Result<Option<Vec<u8>>, BackendError>;

    /// Drop every log and buffer this backend recorded.
    fn clear_recorded_data(&self);
}
