//! Shared test utilities and fixtures.

#![allow(dead_code)]

use pmstream::archive::Archive;
use pmstream::metadata::ArchiveMetadata;
use pmstream::{assemble, AssembleReport, AssemblerConfig, TileCoord};

// Re-export canonical test utilities from pmstream::testing
pub use pmstream::testing::{
    buildings_metadata, payload_for, sequential_tiles, stream_bytes, tiles_from_ids,
};

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Encode `tiles` as a stream and assemble it in memory.
pub fn assemble_tiles(
    metadata: &ArchiveMetadata,
    tiles: &[(TileCoord, Vec<u8>)],
    terminated: bool,
    config: &AssemblerConfig,
) -> (Vec<u8>, AssembleReport) {
    let stream = stream_bytes(metadata, tiles, terminated).expect("stream encodes");
    assemble(stream.as_slice(), config).expect("stream assembles")
}

/// Config that forces leaf directories for small inputs.
pub fn leaf_config(leaf_threshold: usize) -> AssemblerConfig {
    AssemblerConfig {
        leaf_threshold,
        ..AssemblerConfig::default()
    }
}

// ============================================================================
// INVARIANT CHECKS
// ============================================================================

/// Check every structural property a reader relies on.
///
/// Sections are contiguous in order metadata, root, leaves, data; entries
/// are sorted with non-overlapping id ranges; every entry points inside the
/// data section; and header counters agree with the directory.
pub fn assert_archive_well_formed(bytes: &[u8]) {
    let archive = Archive::from_bytes(bytes).expect("archive parses");
    let header = archive.header();
    let sections = header.sections();

    assert_eq!(sections.metadata.0, 127, "metadata follows the header");
    assert_eq!(sections.root.0, sections.metadata.0 + sections.metadata.1);
    assert_eq!(sections.leaves.0, sections.root.0 + sections.root.1);
    assert_eq!(sections.data.0, sections.leaves.0 + sections.leaves.1);
    assert_eq!(sections.total_size(), bytes.len() as u64);

    let entries = archive.entries().expect("directories decode");
    for pair in entries.windows(2) {
        assert!(
            pair[0].tile_id + pair[0].run_length as u64 <= pair[1].tile_id,
            "entries overlap or are unsorted: {:?} then {:?}",
            pair[0],
            pair[1]
        );
    }
    for entry in &entries {
        assert!(entry.run_length >= 1, "tile entry with zero run: {:?}", entry);
        assert!(
            entry.offset + entry.length as u64 <= sections.data.1,
            "entry past data section: {:?}",
            entry
        );
    }

    let addressed: u64 = entries.iter().map(|e| e.run_length as u64).sum();
    assert_eq!(header.addressed_tiles, addressed);
    assert_eq!(header.tile_entries, entries.len() as u64);
}

/// Every tile in `tiles` reads back with its payload.
pub fn assert_tiles_present(bytes: &[u8], tiles: &[(TileCoord, Vec<u8>)]) {
    let archive = Archive::from_bytes(bytes).expect("archive parses");
    for (coord, payload) in tiles {
        let found = archive.get_tile(*coord).expect("lookup succeeds");
        assert_eq!(
            found,
            Some(payload.as_slice()),
            "tile {} missing or wrong",
            coord
        );
    }
}
