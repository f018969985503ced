// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for directory decoding.
//!
//! Directories are read from files nobody vouches for. Counts that lie,
//! truncated columns and offsets past the end must all come back as errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmstream::directory::{decode_directory, encode_directory, find_entry};

fuzz_target!(|data: &[u8]| {
    let Ok(entries) = decode_directory(data) else {
        return;
    };

    // Whatever decoded must survive a second trip unchanged.
    let reencoded = encode_directory(&entries);
    let redecoded = decode_directory(&reencoded).expect("re-encoded directory decodes");
    assert_eq!(entries, redecoded);

    // Lookups on arbitrary (possibly unsorted) entries must not panic.
    for entry in entries.iter().take(16) {
        let _ = find_entry(&entries, entry.tile_id);
        let _ = find_entry(&entries, entry.tile_id.wrapping_add(1));
    }
});
