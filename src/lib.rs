// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Streaming tile protocol and PMTiles v3 archive assembler.
//!
//! A tile generator writes finished tiles to a pipe one at a time, in a
//! line-oriented text protocol. This crate reads that stream and assembles a
//! single-file archive with O(1) random access by tile coordinate, without the
//! generator ever holding more than one tile.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   stream     │──▶│  metadata    │──▶│  directory   │──▶│   archive    │
//! │ (decode line │   │ (merge layer │   │ (entries,    │   │ (header,     │
//! │  by line)    │   │  fragments)  │   │  run-length, │   │  two-pass    │
//! │              │   │              │   │  root/leaf)  │   │  writer)     │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!         │                                                        ▲
//!         └─────────────────────── assemble ───────────────────────┘
//! ```
//!
//! | Module       | Role                                                   |
//! |--------------|--------------------------------------------------------|
//! | `tile`       | `TileCoord` and the Hilbert tile id mapping            |
//! | `stream`     | Protocol encoder and state-machine decoder             |
//! | `metadata`   | Vector layer model and the merge/aggregator            |
//! | `directory`  | Directory builder, varint codec, root/leaf split       |
//! | `archive`    | Header, writer and reader                              |
//! | `assemble`   | Streams in, fail-closed archive file out               |
//!
//! # Usage
//!
//! ```
//! use pmstream::{assemble, Archive, AssemblerConfig, TileCoord};
//!
//! let stream = "TIPPECANOE_STREAM_V1\n\
//!               metadata:{\"vector_layers\":[{\"id\":\"water\",\"minzoom\":0,\"maxzoom\":0}]}\n\
//!               TILE\n\
//!               data:1a2b\n\
//!               END_STREAM\n";
//! let (bytes, report) = assemble(stream.as_bytes(), &AssemblerConfig::default()).unwrap();
//! assert!(!report.truncated);
//!
//! let archive = Archive::from_bytes(&bytes).unwrap();
//! let tile = archive.get_tile(TileCoord::new(0, 0, 0).unwrap()).unwrap();
//! assert_eq!(tile, Some(&[0x1a, 0x2b][..]));
//! ```

pub mod archive;
pub mod assemble;
pub mod compression;
pub mod config;
pub mod contracts;
pub mod directory;
pub mod error;
pub mod metadata;
pub mod stream;
pub mod testing;
pub mod tile;

pub use archive::{Archive, Header, WriteOptions};
pub use assemble::{assemble, assemble_to_file, AssembleReport, Assembler};
pub use compression::{Compression, TileType};
pub use config::AssemblerConfig;
pub use directory::{Directory, DirectoryBuilder, DirectoryEntry};
pub use error::{
    ArchiveError, AssembleError, BuildError, CoordError, OrderingViolation, ProtocolError,
    WriterError,
};
pub use metadata::{
    merge, ArchiveMetadata, FieldType, MergeConflict, MetadataAggregator, VectorLayer,
};
pub use stream::{Completion, StreamDecoder, StreamEncoder, StreamEvent};
pub use tile::{TileCoord, TileId};
