//! Writing archives to disk: atomic replace, fail closed.

use std::fs;

use crate::common::{assert_archive_well_formed, buildings_metadata, sequential_tiles, stream_bytes};
use pmstream::archive::Archive;
use pmstream::{assemble_to_file, AssembleError, AssemblerConfig};

#[test]
fn test_writes_complete_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pmtiles");
    let stream = stream_bytes(&buildings_metadata(), &sequential_tiles(50), true).unwrap();

    let report = assemble_to_file(stream.as_slice(), &path, &AssemblerConfig::default()).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, report.archive_size());
    assert_archive_well_formed(&bytes);

    // Only the archive is left behind; the temporary file was renamed.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_protocol_error_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pmtiles");
    let stream = b"TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:xyz\n";

    let err = assemble_to_file(&stream[..], &path, &AssemblerConfig::default()).unwrap_err();
    assert!(matches!(err, AssembleError::Protocol(_)));
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_ordering_error_keeps_previous_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pmtiles");
    fs::write(&path, b"previous contents").unwrap();

    let stream = "TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE 2/0/0\ndata:01\nTILE 1/0/0\ndata:02\n";
    let err = assemble_to_file(stream.as_bytes(), &path, &AssemblerConfig::default()).unwrap_err();
    assert!(matches!(err, AssembleError::Ordering(_)));
    assert_eq!(fs::read(&path).unwrap(), b"previous contents");
}

#[test]
fn test_replaces_existing_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pmtiles");
    fs::write(&path, b"stale").unwrap();

    let stream = stream_bytes(&buildings_metadata(), &sequential_tiles(3), true).unwrap();
    assemble_to_file(stream.as_slice(), &path, &AssemblerConfig::default()).unwrap();
    assert_eq!(&fs::read(&path).unwrap()[0..7], b"PMTiles");
}

#[test]
fn test_truncated_stream_writes_partial_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.pmtiles");
    let tiles = sequential_tiles(10);
    let stream = stream_bytes(&buildings_metadata(), &tiles, false).unwrap();

    let report = assemble_to_file(stream.as_slice(), &path, &AssemblerConfig::default()).unwrap();
    assert!(report.truncated);

    let bytes = fs::read(&path).unwrap();
    let archive = Archive::from_bytes(&bytes).unwrap();
    assert!(archive.metadata().unwrap().is_partial());
    assert_eq!(archive.header().addressed_tiles, 10);
}
