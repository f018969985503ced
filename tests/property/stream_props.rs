//! Property tests for the stream codec.
//!
//! Verifies:
//! 1. Decoding an encoded stream yields the same metadata and tiles
//! 2. Dropping END_STREAM yields the same tiles, flagged truncated
//! 3. Arbitrary bytes never panic the decoder

use proptest::prelude::*;

use crate::common::{buildings_metadata, stream_bytes};
use pmstream::stream::{Completion, StreamDecoder};
use pmstream::TileCoord;

// ============================================================================
// STRATEGIES
// ============================================================================

/// Sorted distinct tile ids at zoom 0-12, each with a random payload.
fn tiles_strategy() -> impl Strategy<Value = Vec<(TileCoord, Vec<u8>)>> {
    prop::collection::btree_map(
        0u64..22_369_621,
        prop::collection::vec(any::<u8>(), 0..64),
        0..40,
    )
    .prop_map(|tiles| {
        tiles
            .into_iter()
            .map(|(id, payload)| (TileCoord::from_id(id).unwrap(), payload))
            .collect()
    })
}

fn decode(bytes: &[u8]) -> (Vec<(TileCoord, Vec<u8>)>, Option<Completion>) {
    let mut decoder = StreamDecoder::new(bytes);
    decoder.read_metadata().unwrap();
    let mut tiles = Vec::new();
    while let Some(tile) = decoder.next_tile().unwrap() {
        tiles.push(tile);
    }
    (tiles, decoder.completion())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the decoder reproduces exactly what the encoder was given.
    #[test]
    fn prop_stream_roundtrip(tiles in tiles_strategy()) {
        let metadata = buildings_metadata();
        let bytes = stream_bytes(&metadata, &tiles, true).unwrap();

        let mut decoder = StreamDecoder::new(bytes.as_slice());
        prop_assert_eq!(decoder.read_metadata().unwrap(), metadata);

        let (decoded, completion) = decode(&bytes);
        prop_assert_eq!(decoded, tiles);
        prop_assert_eq!(completion, Some(Completion::Complete));
    }

    /// Property: a stream cut before END_STREAM keeps every tile.
    #[test]
    fn prop_truncated_stream_keeps_tiles(tiles in tiles_strategy()) {
        let bytes = stream_bytes(&buildings_metadata(), &tiles, false).unwrap();
        let (decoded, completion) = decode(&bytes);
        prop_assert_eq!(decoded, tiles);
        prop_assert_eq!(completion, Some(Completion::Truncated));
    }

    /// Property: garbage after a valid header is rejected or read, never a panic.
    #[test]
    fn prop_decoder_never_panics(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut input = b"TIPPECANOE_STREAM_V1\nmetadata:{}\n".to_vec();
        input.extend_from_slice(&tail);
        let _: Vec<_> = StreamDecoder::new(input.as_slice()).collect();
    }
}
