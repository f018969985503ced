// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Two-pass archive serialization.
//!
//! Pass one compresses the metadata and directories into memory, which fixes
//! every section's final size, then computes absolute offsets and the header.
//! Pass two emits header, metadata, root, leaves and tile data in that order.
//! Nothing is written until pass one has succeeded.

use std::io::Write;

use crate::archive::header::{metadata_bounds, metadata_center, Header, SectionOffsets};
use crate::compression::{Compression, TileType, GZIP_MAGIC};
use crate::contracts::check_sections_contiguous;
use crate::directory::{build_directories, DirectoryLayout, DirectoryOptions, FinishedTiles};
use crate::error::WriterError;
use crate::metadata::ArchiveMetadata;
use crate::tile::id_to_zxy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Applied to metadata and directories.
    pub internal_compression: Compression,
    /// Compression of the payloads as received; sniffed from the data when `None`.
    pub tile_compression: Option<Compression>,
    /// Derived from the metadata `format` when `None`.
    pub tile_type: Option<TileType>,
    pub leaf_threshold: usize,
    pub root_budget: usize,
    /// Mark the archive as built from a truncated stream.
    pub partial: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        let directories = DirectoryOptions::default();
        Self {
            internal_compression: Compression::Gzip,
            tile_compression: None,
            tile_type: None,
            leaf_threshold: directories.leaf_threshold,
            root_budget: directories.root_budget,
            partial: false,
        }
    }
}

/// An archive whose sections are serialized and placed, awaiting output.
#[derive(Debug)]
pub struct PreparedArchive<'a> {
    pub header: Header,
    metadata: Vec<u8>,
    directories: DirectoryLayout,
    data: &'a [u8],
}

impl PreparedArchive<'_> {
    /// Total archive size in bytes.
    pub fn size(&self) -> u64 {
        self.header.sections().total_size()
    }

    pub fn leaf_count(&self) -> usize {
        self.directories.leaf_count
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WriterError> {
        self.header.write(w)?;
        w.write_all(&self.metadata)?;
        w.write_all(&self.directories.root_bytes)?;
        w.write_all(&self.directories.leaf_bytes)?;
        w.write_all(self.data)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WriterError> {
        let capacity = usize::try_from(self.size()).map_err(|_| WriterError::SectionTooLarge {
            section: "archive",
            size: self.size() as u128,
        })?;
        let mut out = Vec::with_capacity(capacity);
        self.write_to(&mut out)?;
        Ok(out)
    }
}

/// Pass one: serialize every section and compute the header.
pub fn prepare<'a>(
    metadata: &ArchiveMetadata,
    tiles: &'a FinishedTiles,
    options: &WriteOptions,
) -> Result<PreparedArchive<'a>, WriterError> {
    let json = metadata.to_archive_json(options.partial)?;
    let metadata_bytes = options
        .internal_compression
        .compress(&serde_json::to_vec(&json)?)?;

    let directories = build_directories(
        &tiles.entries,
        &DirectoryOptions {
            leaf_threshold: options.leaf_threshold,
            root_budget: options.root_budget,
            compression: options.internal_compression,
        },
    )?;

    let sections = SectionOffsets::layout(
        section_len("metadata", metadata_bytes.len())?,
        section_len("root directory", directories.root_bytes.len())?,
        section_len("leaf directories", directories.leaf_bytes.len())?,
        section_len("tile data", tiles.data.len())?,
    )
    .ok_or(WriterError::SectionTooLarge {
        section: "archive",
        size: metadata_bytes.len() as u128
            + directories.root_bytes.len() as u128
            + directories.leaf_bytes.len() as u128
            + tiles.data.len() as u128,
    })?;

    let (min_zoom, max_zoom) = zoom_range(metadata, tiles);
    let bounds = metadata_bounds(metadata).unwrap_or_default();
    let (center_lon_e7, center_lat_e7, center_zoom) = metadata_center(metadata).unwrap_or_else(|| {
        let (lon, lat) = bounds.center_e7();
        (lon, lat, min_zoom)
    });

    let header = Header {
        root_offset: sections.root.0,
        root_length: sections.root.1,
        metadata_offset: sections.metadata.0,
        metadata_length: sections.metadata.1,
        leaf_offset: sections.leaves.0,
        leaf_length: sections.leaves.1,
        data_offset: sections.data.0,
        data_length: sections.data.1,
        addressed_tiles: tiles.stats.addressed_tiles,
        tile_entries: tiles.stats.tile_entries,
        tile_contents: tiles.stats.tile_contents,
        clustered: true,
        internal_compression: options.internal_compression,
        tile_compression: options
            .tile_compression
            .unwrap_or_else(|| sniff_tile_compression(&tiles.data)),
        tile_type: options
            .tile_type
            .or_else(|| metadata.format.as_deref().map(TileType::from_format))
            .unwrap_or(TileType::Mvt),
        min_zoom,
        max_zoom,
        bounds,
        center_zoom,
        center_lon_e7,
        center_lat_e7,
    };
    check_sections_contiguous(&header);

    Ok(PreparedArchive {
        header,
        metadata: metadata_bytes,
        directories,
        data: &tiles.data,
    })
}

/// Serialize a complete archive into memory.
pub fn write(
    metadata: &ArchiveMetadata,
    tiles: &FinishedTiles,
    options: &WriteOptions,
) -> Result<Vec<u8>, WriterError> {
    prepare(metadata, tiles, options)?.to_bytes()
}

/// Serialize a complete archive into `w`, returning its header.
pub fn write_to<W: Write>(
    w: &mut W,
    metadata: &ArchiveMetadata,
    tiles: &FinishedTiles,
    options: &WriteOptions,
) -> Result<Header, WriterError> {
    let prepared = prepare(metadata, tiles, options)?;
    prepared.write_to(w)?;
    Ok(prepared.header)
}

fn section_len(section: &'static str, len: usize) -> Result<u64, WriterError> {
    u64::try_from(len).map_err(|_| WriterError::SectionTooLarge {
        section,
        size: len as u128,
    })
}

/// Declared global range widened to cover every stored tile.
///
/// A header range that excluded stored tiles would hide them from clients,
/// so observed zooms always win over a narrower declaration.
fn zoom_range(metadata: &ArchiveMetadata, tiles: &FinishedTiles) -> (u8, u8) {
    let observed_min = tiles
        .entries
        .first()
        .and_then(|e| id_to_zxy(e.tile_id).ok())
        .map(|(z, _, _)| z);
    let observed_max = tiles
        .entries
        .last()
        .and_then(|e| id_to_zxy(e.id_end() - 1).ok())
        .map(|(z, _, _)| z);
    let min_zoom = match (metadata.min_zoom, observed_min) {
        (Some(declared), Some(observed)) => declared.min(observed),
        (declared, observed) => declared.or(observed).unwrap_or(0),
    };
    let max_zoom = match (metadata.max_zoom, observed_max) {
        (Some(declared), Some(observed)) => declared.max(observed),
        (declared, observed) => declared.or(observed).unwrap_or(min_zoom),
    };
    (min_zoom, max_zoom.max(min_zoom))
}

fn sniff_tile_compression(data: &[u8]) -> Compression {
    if data.is_empty() {
        Compression::Unknown
    } else if data.starts_with(&GZIP_MAGIC) {
        Compression::Gzip
    } else {
        Compression::None
    }
}
