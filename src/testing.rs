// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit tests, integration tests and benches.
//!
//! Always compiled but hidden from documentation.

#![doc(hidden)]

use std::io;

use crate::metadata::{ArchiveMetadata, VectorLayer};
use crate::stream::encode_stream;
use crate::tile::{TileCoord, TileId};

/// One `buildings` layer at z0-14 with a numeric `height` field.
pub fn buildings_metadata() -> ArchiveMetadata {
    ArchiveMetadata {
        format: Some("pbf".into()),
        ..ArchiveMetadata::new()
    }
    .with_zoom_range(0, 14)
    .with_layer(VectorLayer::new("buildings", 0, 14).with_field("height", "Number"))
}

/// The first `count` tiles in id order, each with a distinct payload.
pub fn sequential_tiles(count: u64) -> Vec<(TileCoord, Vec<u8>)> {
    tiles_from_ids((0..count).map(|id| (id, payload_for(id))))
}

/// Coordinates for `(id, payload)` pairs. Ids beyond zoom 31 are skipped.
pub fn tiles_from_ids<I>(tiles: I) -> Vec<(TileCoord, Vec<u8>)>
where
    I: IntoIterator<Item = (TileId, Vec<u8>)>,
{
    tiles
        .into_iter()
        .filter_map(|(id, payload)| Some((TileCoord::from_id(id).ok()?, payload)))
        .collect()
}

/// A payload that differs for every id and varies in length.
pub fn payload_for(id: TileId) -> Vec<u8> {
    let len = 4 + (id % 13) as usize;
    let mut payload = id.to_le_bytes().to_vec();
    payload.resize(len.max(8), (id % 251) as u8);
    payload
}

/// Full protocol text for `tiles`; without the `END_STREAM` line when
/// `terminated` is false.
pub fn stream_bytes(
    metadata: &ArchiveMetadata,
    tiles: &[(TileCoord, Vec<u8>)],
    terminated: bool,
) -> io::Result<Vec<u8>> {
    let mut bytes = encode_stream(metadata, tiles.iter().map(|(c, p)| (*c, p.as_slice())))?;
    if !terminated {
        let end = b"END_STREAM\n";
        bytes.truncate(bytes.len() - end.len());
    }
    Ok(bytes)
}
