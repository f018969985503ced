// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Accumulates tiles into directory entries and a tile data blob.
//!
//! Tiles must arrive with non-decreasing ids. Three reductions happen on the
//! way in:
//!
//! 1. A repeated id keeps the first payload; later copies are dropped.
//! 2. A tile at the next id with the same bytes as the previous entry extends
//!    that entry's run instead of adding one (think open ocean at z14).
//! 3. With dedup on, a payload seen earlier anywhere in the stream reuses the
//!    earlier offset. Candidates are found by CRC32 and confirmed by comparing
//!    bytes, so a hash collision can never alias two different tiles.

use std::collections::HashMap;

use crate::contracts::check_entries_well_formed;
use crate::directory::DirectoryEntry;
use crate::error::{BuildError, OrderingViolation, WriterError};
use crate::tile::{TileCoord, TileId};

/// Counters describing what the builder did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuilderStats {
    /// Tile ids covered by entries (run lengths summed).
    pub addressed_tiles: u64,
    /// Directory entries.
    pub tile_entries: u64,
    /// Distinct payloads stored in tile data.
    pub tile_contents: u64,
    /// Tiles dropped because their id repeated the previous one.
    pub duplicates_dropped: u64,
}

/// Output of [`DirectoryBuilder::finalize`].
#[derive(Debug, Clone, Default)]
pub struct FinishedTiles {
    pub entries: Vec<DirectoryEntry>,
    pub data: Vec<u8>,
    pub stats: BuilderStats,
}

#[derive(Debug)]
pub struct DirectoryBuilder {
    entries: Vec<DirectoryEntry>,
    data: Vec<u8>,
    last_id: Option<TileId>,
    /// CRC32 -> (offset, length) of every distinct payload, when dedup is on.
    seen: Option<HashMap<u32, Vec<(u64, u32)>>>,
    stats: BuilderStats,
}

impl Default for DirectoryBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DirectoryBuilder {
    pub fn new(dedup: bool) -> Self {
        Self {
            entries: Vec::new(),
            data: Vec::new(),
            last_id: None,
            seen: dedup.then(HashMap::new),
            stats: BuilderStats::default(),
        }
    }

    pub fn append(&mut self, coord: TileCoord, payload: &[u8]) -> Result<(), BuildError> {
        self.append_id(coord.id(), payload)
    }

    /// Add one tile by id.
    ///
    /// Fails with [`OrderingViolation`] if `tile_id` is below the previous id;
    /// the builder is unchanged in that case.
    pub fn append_id(&mut self, tile_id: TileId, payload: &[u8]) -> Result<(), BuildError> {
        if let Some(previous) = self.last_id {
            if tile_id < previous {
                return Err(OrderingViolation {
                    previous,
                    current: tile_id,
                }
                .into());
            }
            if tile_id == previous {
                self.stats.duplicates_dropped += 1;
                tracing::warn!(tile_id, "duplicate tile id, keeping the first payload");
                return Ok(());
            }
        }

        let length = u32::try_from(payload.len()).map_err(|_| WriterError::SectionTooLarge {
            section: "tile payload",
            size: payload.len() as u128,
        })?;

        if self.extend_run(tile_id, payload) {
            self.last_id = Some(tile_id);
            self.stats.addressed_tiles += 1;
            return Ok(());
        }

        let offset = match self.find_stored(payload) {
            Some(offset) => offset,
            None => self.store(payload, length),
        };
        self.entries.push(DirectoryEntry {
            tile_id,
            run_length: 1,
            offset,
            length,
        });
        self.last_id = Some(tile_id);
        self.stats.addressed_tiles += 1;
        self.stats.tile_entries += 1;
        Ok(())
    }

    /// Grow the last entry's run if this tile continues it with equal bytes.
    fn extend_run(&mut self, tile_id: TileId, payload: &[u8]) -> bool {
        let Some(last) = self.entries.last_mut() else {
            return false;
        };
        if last.id_end() != tile_id || last.run_length == u32::MAX {
            return false;
        }
        if last.length as usize != payload.len() {
            return false;
        }
        let start = last.offset as usize;
        if self.data[start..start + payload.len()] != *payload {
            return false;
        }
        last.run_length += 1;
        true
    }

    fn find_stored(&self, payload: &[u8]) -> Option<u64> {
        let seen = self.seen.as_ref()?;
        let candidates = seen.get(&crc32fast::hash(payload))?;
        candidates.iter().find_map(|&(offset, length)| {
            let start = offset as usize;
            let stored = &self.data[start..start + length as usize];
            (stored == payload).then_some(offset)
        })
    }

    fn store(&mut self, payload: &[u8], length: u32) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(payload);
        self.stats.tile_contents += 1;
        if let Some(seen) = self.seen.as_mut() {
            seen.entry(crc32fast::hash(payload))
                .or_default()
                .push((offset, length));
        }
        offset
    }

    pub fn last_id(&self) -> Option<TileId> {
        self.last_id
    }

    pub fn stats(&self) -> BuilderStats {
        self.stats
    }

    /// Bytes of tile data accumulated so far.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn finalize(self) -> FinishedTiles {
        check_entries_well_formed(&self.entries, self.data.len() as u64);
        FinishedTiles {
            entries: self.entries,
            data: self.data,
            stats: self.stats,
        }
    }
}
