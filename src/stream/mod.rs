// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The tile streaming protocol.
//!
//! A generator writes tiles as text lines the moment each one is finished, so
//! it never holds more than one tile. The assembler reads the lines from a pipe
//! and never needs to seek back.
//!
//! ```text
//! TIPPECANOE_STREAM_V1
//! metadata:{"format":"pbf","min_zoom":0,"max_zoom":14,"vector_layers":[...]}
//! TILE                  <- coordinate inferred from order
//! data:1f8b08...
//! TILE 14/8192/5461     <- explicit coordinate
//! data:1f8b08...
//! END_STREAM
//! ```
//!
//! A bare `TILE` gets the tile id after the previous tile's (the first gets
//! id 0), which is how tippecanoe's `--stream-tiles` output is addressed. The
//! explicit `TILE z/x/y` form removes that dependency on emission order.

mod decoder;
mod encoder;

pub use decoder::{Completion, LineParser, State, StreamDecoder, StreamEvent};
pub use encoder::{encode_stream, StreamEncoder};

/// First line of every stream.
pub const STREAM_HEADER: &str = "TIPPECANOE_STREAM_V1";

/// Prefix of the second line; the rest is a JSON object.
pub const METADATA_PREFIX: &str = "metadata:";

/// Opens a tile record.
pub const TILE_MARKER: &str = "TILE";

/// Prefix of the hex payload line following a `TILE` line.
pub const DATA_PREFIX: &str = "data:";

/// Last line of a complete stream.
pub const END_MARKER: &str = "END_STREAM";
