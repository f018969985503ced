// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Root/leaf layout for directory entries.
//!
//! A reader fetches the header and root directory in one 16 KiB request, so
//! the compressed root must fit in what is left after the header. Small
//! archives get a single root holding every entry. Larger ones are cut into
//! leaf directories of `leaf_size` entries, with the root holding one pointer
//! per leaf; `leaf_size` grows by 20% until that pointer list fits.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::compression::Compression;
use crate::contracts::check_leaf_pointers;
use crate::directory::{encode_directory, Directory, DirectoryEntry};
use crate::error::WriterError;

/// Entry count above which a root is never tried.
pub const LEAF_THRESHOLD: usize = 4096;

/// Largest compressed root, in bytes: a 16 KiB first fetch minus the header.
pub const ROOT_BUDGET: usize = 16_384 - crate::archive::HEADER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub leaf_threshold: usize,
    pub root_budget: usize,
    pub compression: Compression,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            leaf_threshold: LEAF_THRESHOLD,
            root_budget: ROOT_BUDGET,
            compression: Compression::Gzip,
        }
    }
}

/// Serialized directories, ready to be placed in the archive.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub root: Directory,
    /// Compressed root directory.
    pub root_bytes: Vec<u8>,
    /// Compressed leaf directories, concatenated in tile id order.
    pub leaf_bytes: Vec<u8>,
    pub leaf_count: usize,
}

/// Lay `entries` out as a root directory and, when needed, leaves.
pub fn build_directories(
    entries: &[DirectoryEntry],
    options: &DirectoryOptions,
) -> Result<DirectoryLayout, WriterError> {
    if entries.len() <= options.leaf_threshold {
        let root_bytes = options.compression.compress(&encode_directory(entries))?;
        if root_bytes.len() <= options.root_budget {
            return Ok(DirectoryLayout {
                root: Directory::Leaf(entries.to_vec()),
                root_bytes,
                leaf_bytes: Vec::new(),
                leaf_count: 0,
            });
        }
    }

    let mut leaf_size = options.leaf_threshold.max(1);
    loop {
        let (pointers, leaf_bytes) = build_leaves(entries, leaf_size, options.compression)?;
        let root_bytes = options.compression.compress(&encode_directory(&pointers))?;
        // One leaf means a one-entry root, which is as small as it gets.
        if root_bytes.len() <= options.root_budget || leaf_size >= entries.len() {
            tracing::debug!(
                leaves = pointers.len(),
                leaf_size,
                root_bytes = root_bytes.len(),
                "split directory into leaves"
            );
            let leaf_count = pointers.len();
            return Ok(DirectoryLayout {
                root: Directory::Root(pointers),
                root_bytes,
                leaf_bytes,
                leaf_count,
            });
        }
        leaf_size += (leaf_size / 5).max(1);
    }
}

fn build_leaves(
    entries: &[DirectoryEntry],
    leaf_size: usize,
    compression: Compression,
) -> Result<(Vec<DirectoryEntry>, Vec<u8>), WriterError> {
    #[cfg(feature = "parallel")]
    let blobs: Vec<Vec<u8>> = entries
        .par_chunks(leaf_size)
        .map(|chunk| compression.compress(&encode_directory(chunk)))
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let blobs: Vec<Vec<u8>> = entries
        .chunks(leaf_size)
        .map(|chunk| compression.compress(&encode_directory(chunk)))
        .collect::<Result<_, _>>()?;

    let mut pointers = Vec::with_capacity(blobs.len());
    let mut leaf_bytes = Vec::with_capacity(blobs.iter().map(Vec::len).sum());
    for (chunk, blob) in entries.chunks(leaf_size).zip(&blobs) {
        let length = u32::try_from(blob.len()).map_err(|_| WriterError::SectionTooLarge {
            section: "leaf directory",
            size: blob.len() as u128,
        })?;
        pointers.push(DirectoryEntry {
            tile_id: chunk[0].tile_id,
            run_length: 0,
            offset: leaf_bytes.len() as u64,
            length,
        });
        leaf_bytes.extend_from_slice(blob);
    }
    check_leaf_pointers(&pointers, leaf_bytes.len() as u64);
    Ok((pointers, leaf_bytes))
}
