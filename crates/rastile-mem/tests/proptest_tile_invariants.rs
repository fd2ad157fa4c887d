#![forbid(unsafe_code)]

//! Property-based invariants for the in-memory tile store.
//!
//! 1. **Write/read round-trip** — merging a run into every intersecting
//!    tile and reading the clipped region back yields exactly the payload
//!    bytes for that region.
//! 2. **Inverse capture rolls back** — the runs captured during a merge,
//!    merged back in, restore the canvas byte-for-byte.
//! 3. **Spatial lookup partition** — every pixel of a clipped rect lies in
//!    exactly one tile returned by `find_tiles`, and every returned tile
//!    intersects the rect.

use proptest::prelude::*;
use rastile_core::{
    BackendError, EditEntry, EditLog, EditMode, LogId, PixelTileStore, Rect, TileEditor,
};
use rastile_mem::MemTileStore;

const CANVAS: u32 = 16;
const TILE: u32 = 4;

/// Minimal recording sink for captured inverse runs.
#[derive(Default)]
struct CaptureLog(Vec<EditEntry>);

impl EditLog for CaptureLog {
    fn push_entry(&mut self, entry: EditEntry) {
        self.0.push(entry);
    }
    fn pop_entry(&mut self) -> Result<Option<EditEntry>, BackendError> {
        Ok(if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        })
    }
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    fn commit(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
    fn id(&self) -> LogId {
        LogId(0)
    }
    fn clear(&mut self) {
        self.0.clear();
    }
}

fn arb_run() -> impl Strategy<Value = (Rect, u8)> {
    (
        0u64..CANVAS as u64,
        0u64..CANVAS as u64,
        1u32..=TILE * 2,
        1u32..=TILE * 2,
        any::<u8>(),
    )
        .prop_map(|(x, y, w, h, value)| (Rect::new(x, y, w, h), value))
}

/// Merge one run into every intersecting tile, optionally recording.
fn write_world(
    store: &MemTileStore,
    rect: &Rect,
    payload: &[u8],
    mut record: Option<&mut dyn EditLog>,
) {
    for tile in store.find_tiles(rect) {
        let mut editor = store.open_editor(tile, EditMode::Write, None).unwrap();
        let rec: Option<&mut dyn EditLog> = match record {
            Some(ref mut log) => Some(&mut **log),
            None => None,
        };
        editor
            .merge_run(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                payload,
                rec,
            )
            .unwrap();
    }
}

proptest! {
    #[test]
    fn write_then_read_round_trips((rect, value) in arb_run()) {
        let store = MemTileStore::with_tile_size(CANVAS, CANVAS, 1, TILE);
        let payload = vec![value; rect.area() as usize];
        write_world(&store, &rect, &payload, None);

        let clipped = store.extent().intersection(&rect);
        prop_assume!(!clipped.is_empty());
        prop_assert_eq!(
            store.read_rect(&clipped),
            vec![value; clipped.area() as usize]
        );
    }

    #[test]
    fn captured_inverse_restores_canvas(
        (first, a) in arb_run(),
        (second, b) in arb_run(),
    ) {
        let store = MemTileStore::with_tile_size(CANVAS, CANVAS, 1, TILE);
        write_world(&store, &first, &vec![a; first.area() as usize], None);
        let before = store.snapshot();

        let mut log = CaptureLog::default();
        write_world(
            &store,
            &second,
            &vec![b; second.area() as usize],
            Some(&mut log),
        );

        // Replaying the captured runs in order restores the canvas: each
        // captured run is tile-local, so no two overlap.
        while let Some(entry) = log.pop_entry().unwrap() {
            write_world(&store, &entry.rect(), &entry.payload, None);
        }
        prop_assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn find_tiles_partitions_the_clipped_rect((rect, _) in arb_run()) {
        let store = MemTileStore::with_tile_size(CANVAS, CANVAS, 1, TILE);
        let tiles = store.find_tiles(&rect);
        for &tile in &tiles {
            prop_assert!(store.tile_extent(tile).intersects(&rect));
        }
        let clipped = store.extent().intersection(&rect);
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                let covering = tiles
                    .iter()
                    .filter(|&&t| store.tile_extent(t).contains(x, y))
                    .count();
                prop_assert_eq!(covering, 1);
            }
        }
    }
}
