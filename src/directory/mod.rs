// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tile directories: the index from tile id to payload bytes.
//!
//! [`DirectoryBuilder`] turns a non-decreasing tile sequence into entries and a
//! tile data blob, collapsing runs and duplicate payloads. [`build_directories`]
//! then lays the entries out as a root directory, spilling into leaf
//! directories when one root would be too large.

mod builder;
mod encoding;
mod layout;

pub use builder::{BuilderStats, DirectoryBuilder, FinishedTiles};
pub use encoding::{decode_directory, decode_varint, encode_directory, encode_varint};
pub use layout::{build_directories, DirectoryLayout, DirectoryOptions, LEAF_THRESHOLD, ROOT_BUDGET};

use crate::tile::TileId;

/// One directory record.
///
/// Covers tile ids `tile_id .. tile_id + run_length`, all sharing the payload at
/// `offset .. offset + length` in the tile data section. A `run_length` of zero
/// marks a pointer to a leaf directory instead, with `offset` relative to the
/// leaf section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectoryEntry {
    pub tile_id: TileId,
    pub run_length: u32,
    pub offset: u64,
    pub length: u32,
}

impl DirectoryEntry {
    #[inline]
    pub fn is_leaf_pointer(&self) -> bool {
        self.run_length == 0
    }

    /// First byte past this entry's payload.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length as u64)
    }

    /// One past the last tile id this entry covers.
    #[inline]
    pub fn id_end(&self) -> u64 {
        self.tile_id.saturating_add(self.run_length as u64)
    }
}

/// A directory is either tile entries or leaf pointers, never a mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directory {
    /// Entries that address tile data directly.
    Leaf(Vec<DirectoryEntry>),
    /// Entries that point at leaf directories.
    Root(Vec<DirectoryEntry>),
}

/// Where a lookup landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The tile's payload location.
    Tile { offset: u64, length: u32 },
    /// Descend into the leaf at this location.
    Leaf { offset: u64, length: u32 },
    Missing,
}

impl Directory {
    /// Classify decoded entries by whether they point at leaves.
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Self {
        if entries.iter().any(DirectoryEntry::is_leaf_pointer) {
            Directory::Root(entries)
        } else {
            Directory::Leaf(entries)
        }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        match self {
            Directory::Leaf(entries) | Directory::Root(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn lookup(&self, tile_id: TileId) -> Lookup {
        find_entry(self.entries(), tile_id)
    }
}

/// Binary search for the entry covering `tile_id`.
///
/// Takes the last entry starting at or before the id. A leaf pointer always
/// matches, since the leaf it names holds every id up to the next pointer.
pub fn find_entry(entries: &[DirectoryEntry], tile_id: TileId) -> Lookup {
    let idx = entries.partition_point(|e| e.tile_id <= tile_id);
    if idx == 0 {
        return Lookup::Missing;
    }
    let entry = entries[idx - 1];
    if entry.is_leaf_pointer() {
        Lookup::Leaf {
            offset: entry.offset,
            length: entry.length,
        }
    } else if tile_id < entry.id_end() {
        Lookup::Tile {
            offset: entry.offset,
            length: entry.length,
        }
    } else {
        Lookup::Missing
    }
}
