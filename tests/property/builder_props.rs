//! Property tests for the directory builder.
//!
//! Verifies:
//! 1. Entries come out sorted with non-overlapping id ranges
//! 2. Identical payloads on adjacent ids collapse into one run
//! 3. A decreasing id is rejected and leaves the builder unchanged
//! 4. Every appended tile is addressable with its own bytes

use proptest::prelude::*;

use pmstream::directory::{Directory, DirectoryBuilder, Lookup};
use pmstream::error::BuildError;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Increasing ids with payloads drawn from a small pool, so runs and
/// duplicate contents both show up.
fn appends_strategy() -> impl Strategy<Value = Vec<(u64, Vec<u8>)>> {
    prop::collection::vec((0u64..4, 0usize..4), 1..200).prop_map(|steps| {
        let pool: [&[u8]; 4] = [b"ocean", b"land", b"", b"coast-\x00\x01"];
        let mut id = 0;
        steps
            .into_iter()
            .map(|(gap, payload)| {
                id += gap;
                (id, pool[payload].to_vec())
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: output entries are sorted and their id ranges disjoint.
    #[test]
    fn prop_entries_sorted_and_disjoint(appends in appends_strategy(), dedup in any::<bool>()) {
        let mut builder = DirectoryBuilder::new(dedup);
        for (id, payload) in &appends {
            builder.append_id(*id, payload).unwrap();
        }
        let done = builder.finalize();
        for pair in done.entries.windows(2) {
            prop_assert!(pair[0].tile_id + pair[0].run_length as u64 <= pair[1].tile_id);
        }
        for entry in &done.entries {
            prop_assert!(entry.run_length >= 1);
            prop_assert!(entry.offset + entry.length as u64 <= done.data.len() as u64);
        }
    }

    /// Property: the first payload for each id is the one stored.
    #[test]
    fn prop_every_tile_addressable(appends in appends_strategy(), dedup in any::<bool>()) {
        let mut builder = DirectoryBuilder::new(dedup);
        for (id, payload) in &appends {
            builder.append_id(*id, payload).unwrap();
        }
        let done = builder.finalize();
        let dir = Directory::from_entries(done.entries.clone());

        let mut previous = None;
        for (id, payload) in &appends {
            if previous == Some(*id) {
                continue;
            }
            previous = Some(*id);
            match dir.lookup(*id) {
                Lookup::Tile { offset, length } => {
                    let stored = &done.data[offset as usize..offset as usize + length as usize];
                    prop_assert_eq!(stored, payload.as_slice());
                }
                other => prop_assert!(false, "tile {} resolved to {:?}", id, other),
            }
        }

        let distinct = appends.iter().map(|(id, _)| *id).collect::<std::collections::BTreeSet<_>>();
        prop_assert_eq!(done.stats.addressed_tiles, distinct.len() as u64);
        prop_assert_eq!(
            done.stats.duplicates_dropped,
            (appends.len() - distinct.len()) as u64
        );
    }

    /// Property: identical bytes on consecutive ids become one entry.
    #[test]
    fn prop_adjacent_identical_payloads_form_run(
        start in 0u64..1_000_000,
        len in 2u32..50,
        payload in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut builder = DirectoryBuilder::new(false);
        for id in start..start + len as u64 {
            builder.append_id(id, &payload).unwrap();
        }
        let done = builder.finalize();
        prop_assert_eq!(done.entries.len(), 1);
        prop_assert_eq!(done.entries[0].run_length, len);
        prop_assert_eq!(done.data.len(), payload.len());
    }

    /// Property: a lower id than the last one fails and changes nothing.
    #[test]
    fn prop_decreasing_id_rejected(
        appends in appends_strategy(),
        back in 1u64..100,
    ) {
        let mut builder = DirectoryBuilder::new(true);
        for (id, payload) in &appends {
            builder.append_id(*id, payload).unwrap();
        }
        let last = builder.last_id().unwrap();
        prop_assume!(last >= back);

        let stats = builder.stats();
        let data_len = builder.data_len();
        let err = builder.append_id(last - back, b"late").unwrap_err();
        match err {
            BuildError::Ordering(v) => {
                prop_assert_eq!(v.previous, last);
                prop_assert_eq!(v.current, last - back);
            }
            other => prop_assert!(false, "unexpected error {:?}", other),
        }
        prop_assert_eq!(builder.stats(), stats);
        prop_assert_eq!(builder.data_len(), data_len);
        prop_assert_eq!(builder.last_id(), Some(last));
    }
}
