#![forbid(unsafe_code)]

//! Property-based invariants for the persisted stack codec.
//!
//! 1. **Round-trip** — any stack the history module can legally hold
//!    decodes back from its encoding unchanged (ids, redo slots, bookmark
//!    position).
//! 2. **Encode of decode is identity** — any byte buffer the decoder
//!    accepts re-encodes to the exact same bytes.
//! 3. **Alignment** — buffers whose length is not a whole number of words
//!    are always rejected.
//! 4. **Shape** — word counts with the wrong parity are always rejected.

use proptest::prelude::*;
use rastile_core::LogId;
use rastile_txn::codec::{self, CodecError, SENTINEL};
use rastile_txn::{HistoryEntry, HistoryStack};

const MAX_ID: u32 = 50_000;

fn arb_undo_entry() -> impl Strategy<Value = HistoryEntry> {
    (0..MAX_ID, proptest::option::of(0..MAX_ID)).prop_map(|(undo, redo)| HistoryEntry {
        undo: LogId(undo),
        redo: redo.map(LogId),
        saved_bookmark: false,
    })
}

fn arb_redo_entry() -> impl Strategy<Value = HistoryEntry> {
    (0..MAX_ID, 0..MAX_ID).prop_map(|(undo, redo)| HistoryEntry {
        undo: LogId(undo),
        redo: Some(LogId(redo)),
        saved_bookmark: false,
    })
}

/// A legal stack: redo entries all carry redo logs, at most one bookmark,
/// bookmark only on the redo side.
fn arb_stack() -> impl Strategy<Value = HistoryStack> {
    (
        proptest::collection::vec(arb_undo_entry(), 0..12),
        proptest::collection::vec(arb_redo_entry(), 0..12),
        proptest::option::of(0usize..12),
    )
        .prop_map(|(undo, mut redo, bookmark)| {
            if let Some(slot) = bookmark {
                if !redo.is_empty() {
                    let at = slot % redo.len();
                    redo[at].saved_bookmark = true;
                }
            }
            HistoryStack::from_parts(undo, redo)
        })
}

proptest! {
    #[test]
    fn round_trip(stack in arb_stack()) {
        let undo_buf = codec::encode_undo(&stack);
        let redo_buf = codec::encode_redo(&stack);
        let decoded = codec::decode(&undo_buf, &redo_buf).unwrap();
        prop_assert_eq!(decoded, stack);
    }

    #[test]
    fn encode_of_accepted_undo_buffer_is_identity(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
        if let Ok(entries) = codec::decode_undo(&bytes) {
            let stack = HistoryStack::from_parts(entries, Vec::new());
            prop_assert_eq!(codec::encode_undo(&stack), bytes);
        }
    }

    #[test]
    fn encode_of_accepted_redo_buffer_is_identity(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
        if let Ok(entries) = codec::decode_redo(&bytes) {
            let stack = HistoryStack::from_parts(Vec::new(), entries);
            prop_assert_eq!(codec::encode_redo(&stack), bytes);
        }
    }

    #[test]
    fn misaligned_lengths_rejected(words in 0usize..8, extra in 1usize..4) {
        let bytes = vec![0u8; words * 4 + extra];
        let undo_misaligned = matches!(
            codec::decode_undo(&bytes),
            Err(CodecError::Misaligned { .. })
        );
        prop_assert!(undo_misaligned);
        let redo_misaligned = matches!(
            codec::decode_redo(&bytes),
            Err(CodecError::Misaligned { .. })
        );
        prop_assert!(redo_misaligned);
    }

    #[test]
    fn wrong_parity_rejected(pairs in 0u32..8) {
        // An undo buffer with an even word count / redo with odd.
        let mut undo_words = vec![pairs];
        undo_words.extend((0..pairs).flat_map(|i| [i, SENTINEL]));
        undo_words.push(0); // one stray word flips the parity
        let undo_bytes: Vec<u8> = undo_words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let undo_rejected = matches!(
            codec::decode_undo(&undo_bytes),
            Err(CodecError::UndoShape { .. } | CodecError::CountMismatch { .. })
        );
        prop_assert!(undo_rejected);

        let mut redo_words = vec![pairs, SENTINEL];
        redo_words.extend((0..pairs).flat_map(|i| [i, i + 1]));
        redo_words.push(0);
        let redo_bytes: Vec<u8> = redo_words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let redo_rejected = matches!(
            codec::decode_redo(&redo_bytes),
            Err(CodecError::RedoShape { .. } | CodecError::CountMismatch { .. })
        );
        prop_assert!(redo_rejected);
    }
}
