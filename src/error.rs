// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the stream-to-archive pipeline.
//!
//! Each stage owns its failure mode. The decoder raises [`ProtocolError`], the
//! directory builder raises [`OrderingViolation`], the writer raises
//! [`WriterError`], the reader raises [`ArchiveError`]. [`AssembleError`] wraps
//! all of them for callers that drive the whole pipeline.
//!
//! Two outcomes are deliberately *not* errors:
//! - a merge conflict between layer field types is resolved to `Mixed` and
//!   reported as a [`MergeConflict`](crate::MergeConflict) value;
//! - a stream that ends without `END_STREAM` still produces an archive, and the
//!   truncation is reported through [`AssembleReport`](crate::AssembleReport).

use std::io;

use thiserror::Error;

use crate::tile::TileId;

/// Malformed or out-of-order stream input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// First line was not the stream header token.
    #[error("bad stream header: expected {expected:?}, got {found:?}")]
    BadHeader {
        expected: &'static str,
        found: String,
    },

    /// Second line missing the `metadata:` prefix, or its JSON did not parse.
    #[error("bad metadata line {line}: {reason}")]
    BadMetadata { line: u64, reason: String },

    /// `TILE` marker without a `data:` line, bad hex, or a bad explicit coordinate.
    #[error("bad tile record at line {line}: {reason}")]
    BadTileRecord { line: u64, reason: String },

    /// Channel closed before the header and metadata were complete.
    #[error("stream ended before {expected}")]
    UnexpectedEof { expected: &'static str },

    /// Underlying channel failure.
    #[error("stream read failed: {0}")]
    Io(#[from] io::Error),
}

/// The producer emitted a tile whose id is below the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tile id {current} arrived after tile id {previous}; ids must be non-decreasing")]
pub struct OrderingViolation {
    pub previous: TileId,
    pub current: TileId,
}

/// Failure while appending a tile to the directory builder.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Ordering(#[from] OrderingViolation),

    /// A single payload longer than an entry's 32-bit length field.
    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// The archive does not fit the format's offset and length fields.
#[derive(Debug, Error)]
pub enum WriterError {
    /// A section or entry exceeds its field's representable range.
    #[error("{section} is too large for the archive format ({size} bytes)")]
    SectionTooLarge { section: &'static str, size: u128 },

    /// Metadata could not be serialized.
    #[error("metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Compression or sink failure.
    #[error("archive write failed: {0}")]
    Io(#[from] io::Error),
}

/// A finished archive failed validation while being read back.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid magic: expected \"PMTiles\", got {0:?}")]
    BadMagic([u8; 7]),

    #[error("unsupported archive version {0} (expected 3)")]
    UnsupportedVersion(u8),

    #[error("{section} section out of bounds: {offset}+{length} exceeds {available} bytes")]
    SectionOutOfBounds {
        section: &'static str,
        offset: u64,
        length: u64,
        available: usize,
    },

    #[error("unknown compression code {0}")]
    UnknownCompression(u8),

    #[error("corrupt directory: {0}")]
    Directory(String),

    #[error("leaf directory nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("invalid metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("archive read failed: {0}")]
    Io(#[from] io::Error),
}

/// A coordinate or tile id outside the addressable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("zoom {0} exceeds the maximum zoom 31")]
    ZoomTooLarge(u8),

    #[error("tile {x}/{y} is outside zoom level {z}")]
    OutOfRange { z: u8, x: u32, y: u32 },

    #[error("tile id {0} is beyond zoom 31")]
    IdTooLarge(TileId),
}

/// Any failure that aborts an archive build.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Ordering(#[from] OrderingViolation),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A previous `ingest` failed; the tiles held are an unknown prefix.
    #[error("an earlier stream failed to ingest; no archive will be written")]
    Aborted,

    #[error("output failed: {0}")]
    Io(#[from] io::Error),
}

impl From<BuildError> for AssembleError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Ordering(v) => AssembleError::Ordering(v),
            BuildError::Writer(e) => AssembleError::Writer(e),
        }
    }
}
