#![forbid(unsafe_code)]

//! Binary codec for the persisted history stacks.
//!
//! Implements encode/decode for the fixed stack layout, one buffer per
//! stack, all fields little-endian `u32`:
//!
//! ```text
//! undo buffer:
//! +-------+----------------------+----------------------+-----
//! | count | undo_0 | redo_0|FFFF | undo_1 | redo_1|FFFF | ...
//! +-------+----------------------+----------------------+-----
//!
//! redo buffer:
//! +-------+---------------+-----------------+-----
//! | count | bookmark|FFFF | undo_0 | redo_0 | ...
//! +-------+---------------+-----------------+-----
//! ```
//!
//! Pairs are written from the *top* of the stack down (pop order); the
//! bookmark index counts in that same written order, 0 being the top entry.
//! `0xFFFF_FFFF` is the sentinel for "no redo log recorded yet" in the undo
//! buffer and "no bookmark" in the redo buffer. Redo-buffer pairs never
//! carry a sentinel redo id — only already-undone entries live on the redo
//! stack, and undoing is what records the redo log.
//!
//! Decoding pushes entries bottom-up, so a buffer written top-to-bottom is
//! walked in reverse and the bookmark is re-applied by written position.
//!
//! # Contract
//!
//! `encode(decode(bytes)) == bytes` for any buffer this module produces.
//! Decode rejects byte lengths that are not a whole number of words, word
//! counts that are not `2n + 1` (undo) or `2n + 2` (redo), counts that
//! disagree with the buffer length, sentinel ids where a real id is
//! required, and bookmark indexes past the entry count.

use rastile_core::LogId;

use crate::history::{HistoryEntry, HistoryStack};

/// Sentinel word: "no redo log yet" / "no bookmark".
pub const SENTINEL: u32 = 0xFFFF_FFFF;

const WORD: usize = 4;

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding a persisted stack buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Buffer length is not a multiple of the word size.
    Misaligned { len: usize },
    /// Undo buffer does not hold `2n + 1` words.
    UndoShape { words: usize },
    /// Redo buffer does not hold `2n + 2` words.
    RedoShape { words: usize },
    /// Declared entry count disagrees with the buffer length.
    CountMismatch { declared: u32, actual: usize },
    /// A required log id slot holds the sentinel.
    ReservedId { word: usize },
    /// A redo-buffer pair is missing its redo id.
    MissingRedoId { word: usize },
    /// Bookmark index is past the entry count.
    BookmarkOutOfRange { index: u32, count: u32 },
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Misaligned { len } => {
                write!(f, "buffer length {len} is not a multiple of {WORD}")
            }
            Self::UndoShape { words } => {
                write!(f, "undo buffer holds {words} words, need 2n + 1")
            }
            Self::RedoShape { words } => {
                write!(f, "redo buffer holds {words} words, need 2n + 2")
            }
            Self::CountMismatch { declared, actual } => {
                write!(f, "declared count {declared} but buffer holds {actual} pairs")
            }
            Self::ReservedId { word } => {
                write!(f, "sentinel in required id slot (word {word})")
            }
            Self::MissingRedoId { word } => {
                write!(f, "redo stack entry without redo id (word {word})")
            }
            Self::BookmarkOutOfRange { index, count } => {
                write!(f, "bookmark index {index} out of range for {count} entries")
            }
        }
    }
}

impl core::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn push_word(buf: &mut Vec<u8>, word: u32) {
    buf.extend_from_slice(&word.to_le_bytes());
}

/// Encode the undo stack, top entry first.
#[must_use]
pub fn encode_undo(stack: &HistoryStack) -> Vec<u8> {
    let entries = stack.undo_entries();
    let mut buf = Vec::with_capacity(WORD * (1 + 2 * entries.len()));
    push_word(&mut buf, entries.len() as u32);
    for entry in entries.iter().rev() {
        debug_assert_ne!(entry.undo.raw(), SENTINEL, "reserved log id on undo stack");
        push_word(&mut buf, entry.undo.raw());
        push_word(&mut buf, entry.redo.map_or(SENTINEL, LogId::raw));
    }
    buf
}

/// Encode the redo stack, top entry first, bookmark by written position.
#[must_use]
pub fn encode_redo(stack: &HistoryStack) -> Vec<u8> {
    let entries = stack.redo_entries();
    let mut buf = Vec::with_capacity(WORD * (2 + 2 * entries.len()));
    push_word(&mut buf, entries.len() as u32);
    let bookmark = entries
        .iter()
        .rev()
        .position(|e| e.saved_bookmark)
        .map_or(SENTINEL, |i| i as u32);
    push_word(&mut buf, bookmark);
    for entry in entries.iter().rev() {
        debug_assert_ne!(entry.undo.raw(), SENTINEL, "reserved log id on redo stack");
        debug_assert!(entry.redo.is_some(), "redo stack entry without redo log");
        push_word(&mut buf, entry.undo.raw());
        push_word(&mut buf, entry.redo.map_or(SENTINEL, LogId::raw));
    }
    buf
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn words_of(bytes: &[u8]) -> Result<Vec<u32>, CodecError> {
    if bytes.len() % WORD != 0 {
        return Err(CodecError::Misaligned { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(WORD)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode an undo buffer into bottom-to-top stack order.
pub fn decode_undo(bytes: &[u8]) -> Result<Vec<HistoryEntry>, CodecError> {
    let words = words_of(bytes)?;
    if words.is_empty() || (words.len() - 1) % 2 != 0 {
        return Err(CodecError::UndoShape { words: words.len() });
    }
    let pairs = (words.len() - 1) / 2;
    if words[0] as usize != pairs {
        return Err(CodecError::CountMismatch {
            declared: words[0],
            actual: pairs,
        });
    }

    // Written top-to-bottom; push bottom-up by walking pairs in reverse.
    let mut entries = Vec::with_capacity(pairs);
    for i in (0..pairs).rev() {
        let word = 1 + 2 * i;
        let undo = words[word];
        if undo == SENTINEL {
            return Err(CodecError::ReservedId { word });
        }
        let redo = words[word + 1];
        entries.push(HistoryEntry {
            undo: LogId(undo),
            redo: (redo != SENTINEL).then_some(LogId(redo)),
            saved_bookmark: false,
        });
    }
    Ok(entries)
}

/// Decode a redo buffer into bottom-to-top stack order.
///
/// Every decoded entry has a real redo id, and the bookmark flag is
/// re-applied to the entry at the written bookmark position.
pub fn decode_redo(bytes: &[u8]) -> Result<Vec<HistoryEntry>, CodecError> {
    let words = words_of(bytes)?;
    if words.len() < 2 || (words.len() - 2) % 2 != 0 {
        return Err(CodecError::RedoShape { words: words.len() });
    }
    let pairs = (words.len() - 2) / 2;
    if words[0] as usize != pairs {
        return Err(CodecError::CountMismatch {
            declared: words[0],
            actual: pairs,
        });
    }
    let bookmark = words[1];
    if bookmark != SENTINEL && bookmark as usize >= pairs {
        return Err(CodecError::BookmarkOutOfRange {
            index: bookmark,
            count: pairs as u32,
        });
    }

    let mut entries = Vec::with_capacity(pairs);
    for i in (0..pairs).rev() {
        let word = 2 + 2 * i;
        let undo = words[word];
        if undo == SENTINEL {
            return Err(CodecError::ReservedId { word });
        }
        let redo = words[word + 1];
        if redo == SENTINEL {
            return Err(CodecError::MissingRedoId { word: word + 1 });
        }
        entries.push(HistoryEntry {
            undo: LogId(undo),
            redo: Some(LogId(redo)),
            saved_bookmark: bookmark == i as u32,
        });
    }
    Ok(entries)
}

/// Decode both buffers into a history stack.
pub fn decode(undo_buf: &[u8], redo_buf: &[u8]) -> Result<HistoryStack, CodecError> {
    Ok(HistoryStack::from_parts(
        decode_undo(undo_buf)?,
        decode_redo(redo_buf)?,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
