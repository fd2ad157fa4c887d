#![forbid(unsafe_code)]

//! State-machine invariants for the raster store, driven by random
//! operation sequences against the in-memory collaborators.
//!
//! After every operation:
//!
//! 1. Every redo-stack entry carries a redo log id.
//! 2. At most one entry across both stacks carries the saved bookmark.
//! 3. Stack depths match a shadow model of the operation sequence.
//! 4. The raster's pixels match the shadow model's snapshot stack as undo
//!    and redo move through history.
//! 5. No transaction is left recording.

use proptest::prelude::*;
use rastile_core::Rect;
use rastile_mem::{MemLogBackend, MemTileStore};
use rastile_txn::{RasterStore, TxnOutcome};

const CANVAS: u32 = 12;
const TILE: u32 = 4;

/// One scripted operation.
#[derive(Debug, Clone)]
enum Op {
    /// Commit one transaction writing `value` over the rect.
    Commit { rect: Rect, value: u8 },
    Undo,
    Redo,
    MarkSaved,
    ClearHistory,
    EmptyTxn,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..CANVAS as u64, 0u64..CANVAS as u64, 1u32..6, 1u32..6, any::<u8>())
            .prop_map(|(x, y, w, h, value)| Op::Commit {
                rect: Rect::new(x, y, w, h),
                value,
            }),
        3 => Just(Op::Undo),
        3 => Just(Op::Redo),
        1 => Just(Op::MarkSaved),
        1 => Just(Op::ClearHistory),
        1 => Just(Op::EmptyTxn),
    ]
}

fn assert_invariants(store: &RasterStore<MemTileStore, MemLogBackend>) {
    assert!(!store.is_recording());
    assert!(
        store
            .history()
            .redo_entries()
            .iter()
            .all(|e| e.redo.is_some()),
        "redo stack entry without redo log"
    );
    let bookmarks = store
        .history()
        .undo_entries()
        .iter()
        .chain(store.history().redo_entries())
        .filter(|e| e.saved_bookmark)
        .count();
    assert!(bookmarks <= 1, "found {bookmarks} bookmarks");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_histories_stay_consistent(ops in proptest::collection::vec(arb_op(), 1..24)) {
        let backend = MemLogBackend::new();
        let tiles = MemTileStore::with_tile_size(CANVAS, CANVAS, 1, TILE);
        let mut store = RasterStore::new(tiles, backend.clone());

        // Shadow model: snapshots after each applied transaction, and the
        // redo side of the same.
        let base = store.tiles().snapshot();
        let mut applied: Vec<Vec<u8>> = Vec::new();
        let mut pending: Vec<Vec<u8>> = Vec::new();

        for op in ops {
            match op {
                Op::Commit { rect, value } => {
                    store.start_transaction().unwrap();
                    let payload = vec![value; rect.area() as usize];
                    store
                        .write_run(rect.x, rect.y, rect.width, rect.height, &payload)
                        .unwrap();
                    match store.end_transaction().unwrap() {
                        TxnOutcome::Committed => {
                            applied.push(store.tiles().snapshot());
                            pending.clear();
                        }
                        TxnOutcome::Empty => {}
                    }
                }
                Op::Undo => {
                    let did = store.undo().unwrap();
                    prop_assert_eq!(did, !applied.is_empty());
                    if did {
                        pending.push(applied.pop().unwrap());
                        let expected = applied.last().unwrap_or(&base);
                        prop_assert_eq!(&store.tiles().snapshot(), expected);
                    }
                }
                Op::Redo => {
                    let did = store.redo().unwrap();
                    prop_assert_eq!(did, !pending.is_empty());
                    if did {
                        let state = pending.pop().unwrap();
                        prop_assert_eq!(&store.tiles().snapshot(), &state);
                        applied.push(state);
                    }
                }
                Op::MarkSaved => {
                    store.mark_saved();
                    prop_assert_eq!(
                        store.history().top_redo_has_bookmark(),
                        !pending.is_empty()
                    );
                }
                Op::ClearHistory => {
                    let snapshot = store.tiles().snapshot();
                    store.clear_history();
                    applied.clear();
                    pending.clear();
                    prop_assert_eq!(backend.committed_count(), 0);
                    // Clearing history never touches pixels.
                    prop_assert_eq!(store.tiles().snapshot(), snapshot);
                }
                Op::EmptyTxn => {
                    store.start_transaction().unwrap();
                    prop_assert_eq!(store.end_transaction().unwrap(), TxnOutcome::Empty);
                }
            }

            assert_invariants(&store);
            prop_assert_eq!(store.undo_depth(), applied.len());
            prop_assert_eq!(store.redo_depth(), pending.len());
        }

        // Committed logs never outnumber what the live history references.
        let referenced = store
            .history()
            .undo_entries()
            .iter()
            .chain(store.history().redo_entries())
            .map(|e| 1 + usize::from(e.redo.is_some()))
            .sum::<usize>();
        prop_assert_eq!(backend.committed_count(), referenced);
    }
}
