// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read a finished archive back: header, metadata, tile lookup.
//!
//! Works over a borrowed byte slice. Lookup descends from the root through at
//! most [`MAX_DEPTH`] leaf levels, so a directory that points at itself is an
//! error rather than a hang.

use serde_json::Value;

use crate::archive::header::{Header, SectionOffsets};
use crate::compression::{Compression, GZIP_MAGIC};
use crate::directory::{decode_directory, Directory, DirectoryEntry, Lookup};
use crate::error::ArchiveError;
use crate::metadata::ArchiveMetadata;
use crate::tile::{TileCoord, TileId};

/// Deepest leaf nesting followed during lookup.
pub const MAX_DEPTH: usize = 4;

#[derive(Debug)]
pub struct Archive<'a> {
    bytes: &'a [u8],
    header: Header,
    root: Directory,
}

impl<'a> Archive<'a> {
    /// Parse the header and root directory.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, ArchiveError> {
        let header = Header::from_bytes(bytes)?;
        let sections = header.sections();
        let root_bytes = SectionOffsets::slice(bytes, "root directory", sections.root)?;
        let root = Directory::from_entries(decode(header.internal_compression, root_bytes)?);
        Ok(Self {
            bytes,
            header,
            root,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// Metadata JSON as stored, decompressed.
    pub fn metadata_json(&self) -> Result<Value, ArchiveError> {
        let raw = SectionOffsets::slice(self.bytes, "metadata", self.header.sections().metadata)?;
        let text = match self.header.internal_compression {
            // Gzip is recognisable by its magic even when the header says otherwise.
            Compression::None | Compression::Unknown if raw.starts_with(&GZIP_MAGIC) => {
                Compression::Gzip.decompress(raw)?
            }
            Compression::None | Compression::Unknown => raw.to_vec(),
            other => other.decompress(raw)?,
        };
        Ok(serde_json::from_slice(&text)?)
    }

    pub fn metadata(&self) -> Result<ArchiveMetadata, ArchiveError> {
        Ok(serde_json::from_value(self.metadata_json()?)?)
    }

    pub fn get_tile(&self, coord: TileCoord) -> Result<Option<&'a [u8]>, ArchiveError> {
        self.get_tile_id(coord.id())
    }

    pub fn get_tile_id(&self, tile_id: TileId) -> Result<Option<&'a [u8]>, ArchiveError> {
        let sections = self.header.sections();
        let mut lookup = self.root.lookup(tile_id);
        for _ in 0..=MAX_DEPTH {
            match lookup {
                Lookup::Missing => return Ok(None),
                Lookup::Tile { offset, length } => {
                    let data = SectionOffsets::slice(self.bytes, "tile data", sections.data)?;
                    let tile = SectionOffsets::slice(data, "tile", (offset, length as u64))?;
                    return Ok(Some(tile));
                }
                Lookup::Leaf { offset, length } => {
                    let leaf = self.leaf(offset, length)?;
                    lookup = leaf.lookup(tile_id);
                }
            }
        }
        Err(ArchiveError::TooDeep(MAX_DEPTH))
    }

    /// Every tile entry, leaves expanded, in tile id order.
    pub fn entries(&self) -> Result<Vec<DirectoryEntry>, ArchiveError> {
        let mut out = Vec::new();
        self.collect(&self.root, 0, &mut out)?;
        Ok(out)
    }

    fn collect(
        &self,
        dir: &Directory,
        depth: usize,
        out: &mut Vec<DirectoryEntry>,
    ) -> Result<(), ArchiveError> {
        if depth > MAX_DEPTH {
            return Err(ArchiveError::TooDeep(MAX_DEPTH));
        }
        for entry in dir.entries() {
            if entry.is_leaf_pointer() {
                let leaf = self.leaf(entry.offset, entry.length)?;
                self.collect(&leaf, depth + 1, out)?;
            } else {
                out.push(*entry);
            }
        }
        Ok(())
    }

    fn leaf(&self, offset: u64, length: u32) -> Result<Directory, ArchiveError> {
        let leaves = SectionOffsets::slice(self.bytes, "leaf directories", self.header.sections().leaves)?;
        let raw = SectionOffsets::slice(leaves, "leaf directory", (offset, length as u64))?;
        Ok(Directory::from_entries(decode(self.header.internal_compression, raw)?))
    }
}

fn decode(compression: Compression, raw: &[u8]) -> Result<Vec<DirectoryEntry>, ArchiveError> {
    let plain = compression.decompress(raw)?;
    decode_directory(&plain).map_err(|e| ArchiveError::Directory(e.to_string()))
}
