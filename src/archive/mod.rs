// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! PMTiles v3 archives: header, writer, reader.
//!
//! ```text
//! +--------+----------+------+--------+-----------+
//! | header | metadata | root | leaves | tile data |
//! +--------+----------+------+--------+-----------+
//!   127 B    JSON       directories     payloads
//! ```

mod header;
mod reader;
mod writer;

pub use header::{
    metadata_bounds, metadata_center, Bounds, Header, SectionOffsets, HEADER_LEN, MAGIC, VERSION,
};
pub use reader::{Archive, MAX_DEPTH};
pub use writer::{prepare, write, write_to, PreparedArchive, WriteOptions};
