// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The fixed 127-byte archive header.
//!
//! Everything a reader needs before touching the rest of the file: where each
//! section lives, how sections and tiles are compressed, and the zoom, bounds
//! and center summary. All integers are little-endian.
//!
//! `SectionOffsets` is the single source of truth for section placement. The
//! writer derives the header from it and the reader validates against it.

use std::io::{self, Read, Write};

use serde_json::Value;

use crate::compression::{Compression, TileType};
use crate::error::ArchiveError;
use crate::metadata::ArchiveMetadata;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MAGIC: [u8; 7] = *b"PMTiles";

pub const VERSION: u8 = 3;

pub const HEADER_LEN: usize = 127;

/// Web Mercator latitude limit.
const MAX_LAT: f64 = 85.051_128_779_806_6;

// ============================================================================
// HEADER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub root_offset: u64,
    pub root_length: u64,
    pub metadata_offset: u64,
    pub metadata_length: u64,
    pub leaf_offset: u64,
    pub leaf_length: u64,
    pub data_offset: u64,
    pub data_length: u64,
    pub addressed_tiles: u64,
    pub tile_entries: u64,
    pub tile_contents: u64,
    pub clustered: bool,
    pub internal_compression: Compression,
    pub tile_compression: Compression,
    pub tile_type: TileType,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub bounds: Bounds,
    pub center_zoom: u8,
    pub center_lon_e7: i32,
    pub center_lat_e7: i32,
}

/// Geographic extent in degrees × 10^7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_lon_e7: i32,
    pub min_lat_e7: i32,
    pub max_lon_e7: i32,
    pub max_lat_e7: i32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::from_degrees(-180.0, -MAX_LAT, 180.0, MAX_LAT)
    }
}

impl Bounds {
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            min_lon_e7: to_e7(west),
            min_lat_e7: to_e7(south),
            max_lon_e7: to_e7(east),
            max_lat_e7: to_e7(north),
        }
    }

    /// Midpoint, in degrees × 10^7.
    pub fn center_e7(&self) -> (i32, i32) {
        let lon = (self.min_lon_e7 as i64 + self.max_lon_e7 as i64) / 2;
        let lat = (self.min_lat_e7 as i64 + self.max_lat_e7 as i64) / 2;
        (lon as i32, lat as i32)
    }
}

fn to_e7(degrees: f64) -> i32 {
    (degrees * 10_000_000.0).round() as i32
}

impl Header {
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..7].copy_from_slice(&MAGIC);
        buf[7] = VERSION;
        let words = [
            self.root_offset,
            self.root_length,
            self.metadata_offset,
            self.metadata_length,
            self.leaf_offset,
            self.leaf_length,
            self.data_offset,
            self.data_length,
            self.addressed_tiles,
            self.tile_entries,
            self.tile_contents,
        ];
        for (i, word) in words.iter().enumerate() {
            let at = 8 + i * 8;
            buf[at..at + 8].copy_from_slice(&word.to_le_bytes());
        }
        buf[96] = self.clustered as u8;
        buf[97] = self.internal_compression.code();
        buf[98] = self.tile_compression.code();
        buf[99] = self.tile_type.code();
        buf[100] = self.min_zoom;
        buf[101] = self.max_zoom;
        buf[102..106].copy_from_slice(&self.bounds.min_lon_e7.to_le_bytes());
        buf[106..110].copy_from_slice(&self.bounds.min_lat_e7.to_le_bytes());
        buf[110..114].copy_from_slice(&self.bounds.max_lon_e7.to_le_bytes());
        buf[114..118].copy_from_slice(&self.bounds.max_lat_e7.to_le_bytes());
        buf[118] = self.center_zoom;
        buf[119..123].copy_from_slice(&self.center_lon_e7.to_le_bytes());
        buf[123..127].copy_from_slice(&self.center_lat_e7.to_le_bytes());
        buf
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, ArchiveError> {
        let mut buf = [0u8; HEADER_LEN];
        r.read_exact(&mut buf)?;
        Self::from_bytes(&buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < HEADER_LEN {
            return Err(ArchiveError::SectionOutOfBounds {
                section: "header",
                offset: 0,
                length: HEADER_LEN as u64,
                available: bytes.len(),
            });
        }
        let mut magic = [0u8; 7];
        magic.copy_from_slice(&bytes[0..7]);
        if magic != MAGIC {
            return Err(ArchiveError::BadMagic(magic));
        }
        if bytes[7] != VERSION {
            return Err(ArchiveError::UnsupportedVersion(bytes[7]));
        }

        let word = |i: usize| {
            let at = 8 + i * 8;
            let mut b = [0u8; 8];
            b.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(b)
        };
        let int = |at: usize| i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let compression = |code: u8| Compression::from_code(code).ok_or(ArchiveError::UnknownCompression(code));

        Ok(Self {
            root_offset: word(0),
            root_length: word(1),
            metadata_offset: word(2),
            metadata_length: word(3),
            leaf_offset: word(4),
            leaf_length: word(5),
            data_offset: word(6),
            data_length: word(7),
            addressed_tiles: word(8),
            tile_entries: word(9),
            tile_contents: word(10),
            clustered: bytes[96] == 1,
            internal_compression: compression(bytes[97])?,
            tile_compression: compression(bytes[98])?,
            tile_type: TileType::from_code(bytes[99]),
            min_zoom: bytes[100],
            max_zoom: bytes[101],
            bounds: Bounds {
                min_lon_e7: int(102),
                min_lat_e7: int(106),
                max_lon_e7: int(110),
                max_lat_e7: int(114),
            },
            center_zoom: bytes[118],
            center_lon_e7: int(119),
            center_lat_e7: int(123),
        })
    }

    pub fn sections(&self) -> SectionOffsets {
        SectionOffsets {
            metadata: (self.metadata_offset, self.metadata_length),
            root: (self.root_offset, self.root_length),
            leaves: (self.leaf_offset, self.leaf_length),
            data: (self.data_offset, self.data_length),
        }
    }
}

// ============================================================================
// SECTION OFFSETS
// ============================================================================

/// `(offset, length)` of each section, absolute from the start of the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOffsets {
    pub metadata: (u64, u64),
    pub root: (u64, u64),
    pub leaves: (u64, u64),
    pub data: (u64, u64),
}

impl SectionOffsets {
    /// Place sections back to back after the header:
    ///
    /// 1. HEADER     [127 B]
    /// 2. METADATA   compressed JSON
    /// 3. ROOT       compressed root directory
    /// 4. LEAVES     compressed leaf directories, may be empty
    /// 5. DATA       tile payloads
    ///
    /// Returns `None` if the total overflows a u64.
    pub fn layout(metadata: u64, root: u64, leaves: u64, data: u64) -> Option<Self> {
        let metadata_at = HEADER_LEN as u64;
        let root_at = metadata_at.checked_add(metadata)?;
        let leaves_at = root_at.checked_add(root)?;
        let data_at = leaves_at.checked_add(leaves)?;
        data_at.checked_add(data)?;
        Some(Self {
            metadata: (metadata_at, metadata),
            root: (root_at, root),
            leaves: (leaves_at, leaves),
            data: (data_at, data),
        })
    }

    pub fn total_size(&self) -> u64 {
        self.data.0 + self.data.1
    }

    /// Borrow a section, checking it lies inside `bytes`.
    pub fn slice<'a>(
        bytes: &'a [u8],
        section: &'static str,
        (offset, length): (u64, u64),
    ) -> Result<&'a [u8], ArchiveError> {
        let out_of_bounds = || ArchiveError::SectionOutOfBounds {
            section,
            offset,
            length,
            available: bytes.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(length).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        bytes.get(start..end).ok_or_else(out_of_bounds)
    }
}

// ============================================================================
// BOUNDS AND CENTER FROM METADATA
// ============================================================================

/// Read `bounds` ("w,s,e,n" or `[w, s, e, n]`) from metadata, if well formed.
pub fn metadata_bounds(metadata: &ArchiveMetadata) -> Option<Bounds> {
    let v = numbers(metadata.extra.get("bounds")?)?;
    match v.as_slice() {
        &[west, south, east, north] => Some(Bounds::from_degrees(west, south, east, north)),
        _ => None,
    }
}

/// Read `center` ("lon,lat,zoom" or `[lon, lat, zoom]`) from metadata.
pub fn metadata_center(metadata: &ArchiveMetadata) -> Option<(i32, i32, u8)> {
    let v = numbers(metadata.extra.get("center")?)?;
    match v.as_slice() {
        &[lon, lat, zoom] => Some((to_e7(lon), to_e7(lat), zoom.clamp(0.0, 31.0) as u8)),
        &[lon, lat] => Some((to_e7(lon), to_e7(lat), 0)),
        _ => None,
    }
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::String(s) => s.split(',').map(|part| part.trim().parse().ok()).collect(),
        Value::Array(items) => items.iter().map(Value::as_f64).collect(),
        _ => None,
    }
}
