// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Runtime contracts for directory and archive invariants.
//!
//! Debug-mode assertions, free in release builds. They fire at the points
//! where an invariant is established (builder finalize, header computation),
//! so a violation is caught next to the code that caused it rather than as a
//! wrong tile at read time.
//!
//! | Contract                     | Invariant                                        |
//! |------------------------------|--------------------------------------------------|
//! | `check_entries_well_formed`  | entries sorted, ranges disjoint, bytes in bounds |
//! | `check_sections_contiguous`  | sections follow the header back to back          |
//! | `check_leaf_pointers`        | root entries point inside the leaf section       |

// ============================================================================
// COMPILE-TIME ASSERTIONS
// ============================================================================

const _: () = {
    // Header is 8 bytes of tag and version, 11 u64 words, 6 single bytes,
    // four i32 bounds, the center zoom byte and two i32 center coordinates.
    assert!(8 + 11 * 8 + 6 + 16 + 1 + 8 == crate::archive::HEADER_LEN);
};

use crate::archive::Header;
use crate::directory::DirectoryEntry;

// ============================================================================
// DIRECTORY CONTRACTS
// ============================================================================

/// Tile entries are sorted by id, cover disjoint id ranges and address bytes
/// inside the tile data section.
///
/// # Panics (debug builds only)
/// On a run length of zero, overlapping ranges, or an entry past `data_len`.
#[inline]
pub fn check_entries_well_formed(entries: &[DirectoryEntry], data_len: u64) {
    #[cfg(debug_assertions)]
    {
        for entry in entries {
            debug_assert!(
                entry.run_length > 0,
                "Contract violation: tile entry {} has run length 0",
                entry.tile_id
            );
            debug_assert!(
                entry.end() <= data_len,
                "Contract violation: entry {} addresses bytes {}..{} past data length {}",
                entry.tile_id,
                entry.offset,
                entry.end(),
                data_len
            );
        }
        for pair in entries.windows(2) {
            debug_assert!(
                pair[0].id_end() <= pair[1].tile_id,
                "Contract violation: entry ranges overlap ({}+{} vs {})",
                pair[0].tile_id,
                pair[0].run_length,
                pair[1].tile_id
            );
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = (entries, data_len);
}

/// Root entries are leaf pointers, sorted, inside a leaf section of `leaf_len`.
#[inline]
pub fn check_leaf_pointers(pointers: &[DirectoryEntry], leaf_len: u64) {
    #[cfg(debug_assertions)]
    {
        for entry in pointers {
            debug_assert!(
                entry.is_leaf_pointer() && entry.end() <= leaf_len,
                "Contract violation: bad leaf pointer {:?} for leaf section of {} bytes",
                entry,
                leaf_len
            );
        }
        for pair in pointers.windows(2) {
            debug_assert!(
                pair[0].tile_id < pair[1].tile_id,
                "Contract violation: leaf pointers out of order"
            );
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = (pointers, leaf_len);
}

// ============================================================================
// ARCHIVE CONTRACTS
// ============================================================================

/// Metadata starts right after the header and each section starts where the
/// previous one ends.
#[inline]
pub fn check_sections_contiguous(header: &Header) {
    debug_assert_eq!(
        header.metadata_offset,
        crate::archive::HEADER_LEN as u64,
        "Contract violation: metadata does not follow the header"
    );
    debug_assert_eq!(
        header.root_offset,
        header.metadata_offset + header.metadata_length,
        "Contract violation: root directory does not follow metadata"
    );
    debug_assert_eq!(
        header.leaf_offset,
        header.root_offset + header.root_length,
        "Contract violation: leaf directories do not follow the root"
    );
    debug_assert_eq!(
        header.data_offset,
        header.leaf_offset + header.leaf_length,
        "Contract violation: tile data does not follow the leaves"
    );
}
