// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for reading archives.
//!
//! Header fields are trusted by nothing: every section offset, leaf pointer
//! and compression code must be checked before it is used.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmstream::Archive;

fuzz_target!(|data: &[u8]| {
    let Ok(archive) = Archive::from_bytes(data) else {
        return;
    };
    let _ = archive.metadata();
    let _ = archive.entries();
    for tile_id in [0u64, 1, 5, 1000] {
        let _ = archive.get_tile_id(tile_id);
    }
});
