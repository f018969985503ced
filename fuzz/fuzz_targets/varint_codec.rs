// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for varint (LEB128) encoding/decoding.
//!
//! Every directory column is a varint. If decode panics on malformed input,
//! a corrupt archive takes the reader down with it.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmstream::directory::{decode_varint, encode_varint};

fuzz_target!(|data: &[u8]| {
    if let Ok((value, consumed)) = decode_varint(data) {
        let mut reencoded = Vec::new();
        encode_varint(value, &mut reencoded);

        let (redecoded, reconsumed) = decode_varint(&reencoded)
            .expect("Re-encoding of valid value should always decode");
        assert_eq!(value, redecoded, "Roundtrip failed: {} != {}", value, redecoded);
        assert_eq!(reconsumed, reencoded.len());

        assert!(consumed <= 10, "Varint consumed {} bytes, max is 10", consumed);
        assert!(consumed <= data.len());
    }
});
