// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Stream encoder: the generator side of the protocol.
//!
//! Tiles are written as soon as they are handed over, so the producer holds at
//! most one tile at a time. A tile whose coordinate is the one the decoder
//! would infer gets a bare `TILE` line; anything else is written with its
//! explicit `z/x/y`, which keeps every sequence decodable.

use std::io::{self, Write};

use super::{DATA_PREFIX, END_MARKER, METADATA_PREFIX, STREAM_HEADER, TILE_MARKER};
use crate::metadata::ArchiveMetadata;
use crate::tile::{TileCoord, TileId};

pub struct StreamEncoder<W: Write> {
    writer: W,
    next_id: TileId,
    started: bool,
}

impl<W: Write> StreamEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_id: 0,
            started: false,
        }
    }

    /// Header and metadata lines. Must precede every tile.
    pub fn begin(&mut self, metadata: &ArchiveMetadata) -> io::Result<()> {
        if self.started {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "stream header already written",
            ));
        }
        let json = serde_json::to_string(metadata)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{}", STREAM_HEADER)?;
        writeln!(self.writer, "{}{}", METADATA_PREFIX, json)?;
        self.started = true;
        Ok(())
    }

    pub fn write_tile(&mut self, coord: TileCoord, payload: &[u8]) -> io::Result<()> {
        if !self.started {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "tile written before stream header",
            ));
        }
        let id = coord.id();
        if id == self.next_id {
            writeln!(self.writer, "{}", TILE_MARKER)?;
        } else {
            writeln!(self.writer, "{} {}", TILE_MARKER, coord)?;
        }
        self.writer.write_all(DATA_PREFIX.as_bytes())?;
        self.writer.write_all(hex::encode(payload).as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.next_id = id + 1;
        Ok(())
    }

    /// Terminator line; flushes and returns the sink.
    pub fn finish(mut self) -> io::Result<W> {
        writeln!(self.writer, "{}", END_MARKER)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Encode a complete stream into memory.
pub fn encode_stream<'a, I>(metadata: &ArchiveMetadata, tiles: I) -> io::Result<Vec<u8>>
where
    I: IntoIterator<Item = (TileCoord, &'a [u8])>,
{
    let mut encoder = StreamEncoder::new(Vec::new());
    encoder.begin(metadata)?;
    for (coord, payload) in tiles {
        encoder.write_tile(coord, payload)?;
    }
    encoder.finish()
}
