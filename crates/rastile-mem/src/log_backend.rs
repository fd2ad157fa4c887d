#![forbid(unsafe_code)]

//! In-memory edit-log backend.
//!
//! Logs are recorded into a handle-local entry list and land in the shared
//! backend state on commit, addressed by `(kind, id)`. Opening a committed
//! log clones its entries into a fresh handle with its own read cursor, so
//! every replay gets a full pass.
//!
//! The backend doubles as the test harness's observation point: it counts
//! log creations per kind (the lazy-redo caching property is asserted
//! through it), can truncate a committed entry's payload below its declared
//! length, and can fail the next creation on demand.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rastile_core::{BackendError, EditEntry, EditLog, LogBackend, LogId, LogKind};

#[derive(Default)]
struct Inner {
    next_id: u32,
    committed: HashMap<(LogKind, u32), Vec<EditEntry>>,
    buffers: HashMap<LogKind, Vec<u8>>,
    created_undo: usize,
    created_redo: usize,
    fail_next_create: bool,
}

/// Shared-state in-memory log backend. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemLogBackend {
    inner: Rc<RefCell<Inner>>,
}

impl MemLogBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many logs of `kind` have been created so far.
    #[must_use]
    pub fn created_count(&self, kind: LogKind) -> usize {
        let inner = self.inner.borrow();
        match kind {
            LogKind::Undo => inner.created_undo,
            LogKind::Redo => inner.created_redo,
        }
    }

    /// Number of committed logs currently stored.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.inner.borrow().committed.len()
    }

    /// Whether a committed log exists for `(kind, id)`.
    #[must_use]
    pub fn has_log(&self, kind: LogKind, id: LogId) -> bool {
        self.inner.borrow().committed.contains_key(&(kind, id.0))
    }

    /// Make the next `create_log` fail with a storage error.
    pub fn fail_next_create(&self) {
        self.inner.borrow_mut().fail_next_create = true;
    }

    /// Truncate the payload of entry `index` in a committed log to `keep`
    /// bytes, leaving its declared length untouched.
    ///
    /// Returns `false` if the log or entry does not exist.
    pub fn truncate_entry(&self, kind: LogKind, id: LogId, index: usize, keep: usize) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(entries) = inner.committed.get_mut(&(kind, id.0)) else {
            return false;
        };
        let Some(entry) = entries.get_mut(index) else {
            return false;
        };
        entry.payload.truncate(keep);
        true
    }
}

impl LogBackend for MemLogBackend {
    type Log = MemEditLog;

    fn create_log(&self, kind: LogKind) -> Result<MemEditLog, BackendError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_create {
            inner.fail_next_create = false;
            return Err(BackendError::Storage("injected create failure".into()));
        }
        // The all-ones id is the persisted-format sentinel, never assigned.
        if inner.next_id == u32::MAX {
            return Err(BackendError::LogLimit);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        match kind {
            LogKind::Undo => inner.created_undo += 1,
            LogKind::Redo => inner.created_redo += 1,
        }
        Ok(MemEditLog {
            inner: Rc::clone(&self.inner),
            kind,
            id: LogId(id),
            entries: Vec::new(),
            cursor: 0,
        })
    }

    fn open_log(&self, kind: LogKind, id: LogId) -> Result<MemEditLog, BackendError> {
        let inner = self.inner.borrow();
        let entries = inner
            .committed
            .get(&(kind, id.0))
            .cloned()
            .ok_or(BackendError::LogNotFound { kind, id })?;
        Ok(MemEditLog {
            inner: Rc::clone(&self.inner),
            kind,
            id,
            entries,
            cursor: 0,
        })
    }

    fn discard_log(&self, kind: LogKind, id: LogId) {
        self.inner.borrow_mut().committed.remove(&(kind, id.0));
    }

    fn put_buffer(&self, kind: LogKind, bytes: &[u8]) -> Result<(), BackendError> {
        self.inner.borrow_mut().buffers.insert(kind, bytes.to_vec());
        Ok(())
    }

    fn get_buffer(&self, kind: LogKind) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.inner.borrow().buffers.get(&kind).cloned())
    }

    fn clear_recorded_data(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.committed.clear();
        inner.buffers.clear();
    }
}

/// Handle to one edit log: a recording buffer before commit, a cloned view
/// with a read cursor after open.
pub struct MemEditLog {
    inner: Rc<RefCell<Inner>>,
    kind: LogKind,
    id: LogId,
    entries: Vec<EditEntry>,
    cursor: usize,
}

impl EditLog for MemEditLog {
    fn push_entry(&mut self, entry: EditEntry) {
        self.entries.push(entry);
    }

    fn pop_entry(&mut self) -> Result<Option<EditEntry>, BackendError> {
        let entry = self.entries.get(self.cursor).cloned();
        if entry.is_some() {
            self.cursor += 1;
        }
        Ok(entry)
    }

    fn is_empty(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        self.inner
            .borrow_mut()
            .committed
            .insert((self.kind, self.id.0), self.entries.clone());
        Ok(())
    }

    fn id(&self) -> LogId {
        self.id
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
