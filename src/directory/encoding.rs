// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Directory serialization: varints in four column runs.
//!
//! Entries are written column by column (all tile id deltas, then all run
//! lengths, then all lengths, then all offsets) because homogeneous columns
//! compress far better than interleaved records. Within a column:
//!
//! - tile ids are delta-coded against the previous entry;
//! - an offset of `0` means "immediately after the previous entry's bytes",
//!   any other value is the absolute offset plus one.
//!
//! # References
//!
//! - **Varint (LEB128)**: little-endian base-128 integers, as used by
//!   Protocol Buffers. <https://protobuf.dev/programming-guides/encoding/>

use std::io;

use super::DirectoryEntry;

/// A u64 never needs more than 10 LEB128 bytes.
pub const MAX_VARINT_BYTES: usize = 10;

// ============================================================================
// VARINT ENCODING
// ============================================================================

pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Decode a varint, returning `(value, bytes_consumed)`.
///
/// Fails on an empty buffer, a varint cut off by the end of the buffer, or
/// one longer than [`MAX_VARINT_BYTES`].
pub fn decode_varint(bytes: &[u8]) -> io::Result<(u64, usize)> {
    if bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "empty buffer for varint",
        ));
    }

    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_BYTES) {
        let low = (byte & 0x7F) as u64;
        // The tenth byte may only carry the top bit of a u64.
        if shift == 63 && low > 1 {
            return Err(invalid("varint overflows u64"));
        }
        result |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    if bytes.len() >= MAX_VARINT_BYTES {
        Err(invalid("varint exceeds maximum length"))
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete varint",
        ))
    }
}

/// Cursor over a byte slice of varints.
struct VarintReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> VarintReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn next(&mut self) -> io::Result<u64> {
        let (value, consumed) = decode_varint(&self.bytes[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    fn next_u32(&mut self, what: &str) -> io::Result<u32> {
        let value = self.next()?;
        u32::try_from(value).map_err(|_| invalid(&format!("{} {} exceeds u32", what, value)))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

// ============================================================================
// DIRECTORY ENCODING
// ============================================================================

/// Serialize entries (uncompressed).
pub fn encode_directory(entries: &[DirectoryEntry]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(entries.len() * 6 + MAX_VARINT_BYTES);
    encode_varint(entries.len() as u64, &mut buf);

    let mut last_id = 0;
    for entry in entries {
        encode_varint(entry.tile_id - last_id, &mut buf);
        last_id = entry.tile_id;
    }
    for entry in entries {
        encode_varint(entry.run_length as u64, &mut buf);
    }
    for entry in entries {
        encode_varint(entry.length as u64, &mut buf);
    }
    let mut previous: Option<&DirectoryEntry> = None;
    for entry in entries {
        match previous {
            Some(prev) if prev.offset.checked_add(prev.length as u64) == Some(entry.offset) => {
                encode_varint(0, &mut buf)
            }
            _ => encode_varint(entry.offset + 1, &mut buf),
        }
        previous = Some(entry);
    }
    buf
}

/// Parse entries produced by [`encode_directory`] (after decompression).
pub fn decode_directory(bytes: &[u8]) -> io::Result<Vec<DirectoryEntry>> {
    let mut reader = VarintReader::new(bytes);
    let count = reader.next()?;

    // Every entry takes at least four bytes, one per column. Bounding the count
    // by the input keeps a corrupt prefix from forcing a huge allocation.
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count > reader.remaining() / 4 {
        return Err(invalid(&format!(
            "directory claims {} entries but only {} bytes follow",
            count,
            reader.remaining()
        )));
    }

    let mut entries = vec![DirectoryEntry::default(); count];

    let mut last_id: u64 = 0;
    for entry in entries.iter_mut() {
        let delta = reader.next()?;
        last_id = last_id
            .checked_add(delta)
            .ok_or_else(|| invalid("tile id overflows u64"))?;
        entry.tile_id = last_id;
    }
    for entry in entries.iter_mut() {
        entry.run_length = reader.next_u32("run length")?;
    }
    for entry in entries.iter_mut() {
        entry.length = reader.next_u32("length")?;
    }
    for i in 0..count {
        let raw = reader.next()?;
        let offset = if raw == 0 {
            if i == 0 {
                return Err(invalid("first entry has a relative offset"));
            }
            let prev = entries[i - 1];
            prev.offset
                .checked_add(prev.length as u64)
                .ok_or_else(|| invalid("offset overflows u64"))?
        } else {
            raw - 1
        };
        entries[i].offset = offset;
    }

    if reader.remaining() != 0 {
        return Err(invalid(&format!(
            "{} trailing bytes after directory",
            reader.remaining()
        )));
    }
    Ok(entries)
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}
