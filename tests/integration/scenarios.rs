//! End-to-end assembly scenarios.

use crate::common::{
    assemble_tiles, assert_archive_well_formed, assert_tiles_present, buildings_metadata,
};
use pmstream::archive::{Archive, HEADER_LEN};
use pmstream::metadata::{ArchiveMetadata, FieldType, VectorLayer};
use pmstream::{assemble, AssembleError, Assembler, AssemblerConfig, TileCoord};

fn coord(z: u8, x: u32, y: u32) -> TileCoord {
    TileCoord::new(z, x, y).unwrap()
}

#[test]
fn test_buildings_archive() {
    let tiles = vec![
        (coord(0, 0, 0), b"world".to_vec()),
        (coord(1, 0, 0), b"nw".to_vec()),
        (coord(1, 0, 1), b"sw".to_vec()),
    ];
    let (bytes, report) = assemble_tiles(
        &buildings_metadata(),
        &tiles,
        true,
        &AssemblerConfig::default(),
    );

    assert_eq!(&bytes[0..7], b"PMTiles");
    assert_eq!(bytes[7], 3);
    assert!(bytes.len() > HEADER_LEN);
    assert!(!report.truncated);
    assert_eq!(report.stats.addressed_tiles, 3);

    let archive = Archive::from_bytes(&bytes).unwrap();
    let metadata = archive.metadata().unwrap();
    assert_eq!(metadata.vector_layers.len(), 1);
    assert_eq!(metadata.vector_layers[0].id, "buildings");
    assert!(!metadata.is_partial());

    let header = archive.header();
    assert_eq!((header.min_zoom, header.max_zoom), (0, 14));
    assert_archive_well_formed(&bytes);
    assert_tiles_present(&bytes, &tiles);
}

#[test]
fn test_chunked_fields_merge() {
    let chunk = |field: &str, ty: &str, at: TileCoord, payload: &[u8]| {
        let metadata = ArchiveMetadata::new()
            .with_layer(VectorLayer::new("buildings", 0, 14).with_field(field, ty));
        pmstream::testing::stream_bytes(&metadata, &[(at, payload.to_vec())], true).unwrap()
    };
    let first = chunk("height", "number", coord(0, 0, 0), &b"a"[..]);
    let second = chunk("name", "string", coord(2, 1, 1), &b"b"[..]);

    let mut assembler = Assembler::default();
    assembler.ingest(first.as_slice()).unwrap();
    assembler.ingest(second.as_slice()).unwrap();
    let (bytes, report) = assembler.finish().unwrap();
    assert_eq!(report.streams, 2);
    assert!(report.conflicts.is_empty());

    let metadata = Archive::from_bytes(&bytes).unwrap().metadata().unwrap();
    assert_eq!(metadata.vector_layers.len(), 1);
    let fields = &metadata.vector_layers[0].fields;
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["height"], FieldType::Number);
    assert_eq!(fields["name"], FieldType::String);
}

#[test]
fn test_truncated_stream_is_partial() {
    let tiles = pmstream::testing::sequential_tiles(5);
    let (bytes, report) = assemble_tiles(
        &buildings_metadata(),
        &tiles,
        false,
        &AssemblerConfig::default(),
    );

    assert!(report.truncated);
    let archive = Archive::from_bytes(&bytes).unwrap();
    assert!(archive.metadata().unwrap().is_partial());
    assert_eq!(archive.metadata_json().unwrap()["partial"], true);
    assert_tiles_present(&bytes, &tiles);
    assert_archive_well_formed(&bytes);
}

#[test]
fn test_type_conflict_is_reported_not_fatal() {
    let make = |ty: &str| {
        ArchiveMetadata::new().with_layer(VectorLayer::new("poi", 0, 4).with_field("rank", ty))
    };
    let mut assembler = Assembler::default();
    for ty in ["Number", "String"] {
        let stream = pmstream::testing::stream_bytes(&make(ty), &[], true).unwrap();
        assembler.ingest(stream.as_slice()).unwrap();
    }
    let (bytes, report) = assembler.finish().unwrap();
    assert_eq!(report.conflicts.len(), 1);
    let metadata = Archive::from_bytes(&bytes).unwrap().metadata().unwrap();
    assert_eq!(metadata.layer("poi").unwrap().fields["rank"], FieldType::Mixed);
}

#[test]
fn test_duplicate_ids_keep_first_payload() {
    let stream = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                  TILE 0/0/0\ndata:01\n\
                  TILE 0/0/0\ndata:02\n\
                  TILE 1/0/0\ndata:03\n\
                  END_STREAM\n";
    let (bytes, report) = assemble(stream.as_bytes(), &AssemblerConfig::default()).unwrap();
    assert_eq!(report.tiles_received, 3);
    assert_eq!(report.stats.duplicates_dropped, 1);
    assert_eq!(report.stats.addressed_tiles, 2);

    let archive = Archive::from_bytes(&bytes).unwrap();
    assert_eq!(archive.get_tile(coord(0, 0, 0)).unwrap(), Some(&[0x01][..]));
    assert_eq!(archive.get_tile(coord(1, 0, 0)).unwrap(), Some(&[0x03][..]));
}

#[test]
fn test_out_of_order_stream_fails() {
    let stream = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                  TILE 1/0/0\ndata:01\n\
                  TILE 0/0/0\ndata:02\n\
                  END_STREAM\n";
    let err = assemble(stream.as_bytes(), &AssemblerConfig::default()).unwrap_err();
    match err {
        AssembleError::Ordering(v) => {
            assert_eq!(v.previous, 1);
            assert_eq!(v.current, 0);
        }
        other => panic!("expected ordering violation, got {:?}", other),
    }
}

#[test]
fn test_malformed_stream_fails() {
    let stream = "TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\nEND_STREAM\n";
    assert!(matches!(
        assemble(stream.as_bytes(), &AssemblerConfig::default()),
        Err(AssembleError::Protocol(_))
    ));
}

#[test]
fn test_empty_stream_gives_valid_archive() {
    let stream = pmstream::testing::stream_bytes(&buildings_metadata(), &[], true).unwrap();
    let (bytes, report) = assemble(stream.as_slice(), &AssemblerConfig::default()).unwrap();
    assert_eq!(report.stats.addressed_tiles, 0);

    let archive = Archive::from_bytes(&bytes).unwrap();
    assert!(archive.root().is_empty());
    assert_eq!(archive.get_tile(coord(0, 0, 0)).unwrap(), None);
    assert_eq!(archive.header().sections().data.1, 0);
    assert_archive_well_formed(&bytes);
}

#[test]
fn test_bare_tile_chunks_form_one_archive() {
    let first = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                 TILE\ndata:aa\n\
                 TILE\ndata:bb\n\
                 END_STREAM\n";
    let second = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                  TILE\ndata:cc\n\
                  TILE\ndata:dd\n\
                  END_STREAM\n";
    let mut assembler = Assembler::default();
    assembler.ingest(first.as_bytes()).unwrap();
    assembler.ingest(second.as_bytes()).unwrap();
    let (bytes, report) = assembler.finish().unwrap();
    assert_eq!(report.streams, 2);
    assert_eq!(report.stats.addressed_tiles, 4);

    // Ids 0..4: 0/0/0 then the first three z1 tiles on the Hilbert curve.
    let expected = vec![
        (coord(0, 0, 0), vec![0xaa]),
        (coord(1, 0, 0), vec![0xbb]),
        (coord(1, 0, 1), vec![0xcc]),
        (coord(1, 1, 1), vec![0xdd]),
    ];
    assert_tiles_present(&bytes, &expected);
    assert_archive_well_formed(&bytes);
}

#[test]
fn test_failed_chunk_prevents_archive() {
    let good = pmstream::testing::stream_bytes(
        &buildings_metadata(),
        &pmstream::testing::sequential_tiles(3),
        true,
    )
    .unwrap();
    let bad = "TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:not-hex\n";

    let mut assembler = Assembler::default();
    assembler.ingest(good.as_slice()).unwrap();
    assert!(matches!(
        assembler.ingest(bad.as_bytes()),
        Err(AssembleError::Protocol(_))
    ));
    assert!(matches!(assembler.finish(), Err(AssembleError::Aborted)));
}
