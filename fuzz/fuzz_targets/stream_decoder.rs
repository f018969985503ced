// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the tile stream decoder.
//!
//! The stream arrives over a pipe from another process. Any byte sequence
//! must produce events or a protocol error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmstream::stream::{StreamDecoder, StreamEvent};

fuzz_target!(|data: &[u8]| {
    let mut tiles = 0u64;
    let mut decoder = StreamDecoder::new(data);
    for event in decoder.by_ref() {
        match event {
            Ok(StreamEvent::Tile(coord, _)) => {
                tiles += 1;
                assert!(coord.z() <= 31);
            }
            Ok(_) => {}
            Err(_) => return,
        }
    }
    assert_eq!(decoder.tiles_read(), tiles);
});
