//! Tests for the line protocol decoder: grammar, coordinate inference, and
//! rejection of malformed input.

use pmstream::error::ProtocolError;
use pmstream::stream::{Completion, LineParser, State, StreamDecoder, StreamEvent};
use pmstream::TileCoord;

fn decode_all(input: &str) -> Result<Vec<StreamEvent>, ProtocolError> {
    StreamDecoder::new(input.as_bytes()).collect()
}

fn tiles(input: &str) -> Vec<(TileCoord, Vec<u8>)> {
    let mut decoder = StreamDecoder::new(input.as_bytes());
    decoder.read_metadata().unwrap();
    let mut out = Vec::new();
    while let Some(tile) = decoder.next_tile().unwrap() {
        out.push(tile);
    }
    out
}

// ============================================================================
// WELL-FORMED STREAMS
// ============================================================================

#[test]
fn test_minimal_stream() {
    let events = decode_all("TIPPECANOE_STREAM_V1\nmetadata:{}\nEND_STREAM\n").unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], StreamEvent::Header);
    assert!(matches!(events[1], StreamEvent::Metadata(_)));
    assert_eq!(events[2], StreamEvent::End);
}

#[test]
fn test_bare_tiles_follow_id_order() {
    let input = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                 TILE\ndata:00\nTILE\ndata:01\nTILE\ndata:02\nEND_STREAM\n";
    let decoded = tiles(input);
    let ids: Vec<u64> = decoded.iter().map(|(c, _)| c.id()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(decoded[2].1, vec![0x02]);
}

#[test]
fn test_bare_tile_continues_after_explicit_one() {
    let input = "TIPPECANOE_STREAM_V1\nmetadata:{}\n\
                 TILE 2/0/0\ndata:aa\nTILE\ndata:bb\nEND_STREAM\n";
    let decoded = tiles(input);
    let first = decoded[0].0.id();
    assert_eq!(first, 5);
    assert_eq!(decoded[1].0.id(), first + 1);
}

#[test]
fn test_crlf_and_blank_lines_are_tolerated() {
    let input = "TIPPECANOE_STREAM_V1\r\nmetadata:{}\r\n\r\nTILE\r\ndata:ff\r\n\nEND_STREAM\r\n";
    let decoded = tiles(input);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].1, vec![0xff]);
}

#[test]
fn test_empty_payload() {
    let decoded = tiles("TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:\nEND_STREAM\n");
    assert_eq!(decoded.len(), 1);
    assert!(decoded[0].1.is_empty());
}

#[test]
fn test_uppercase_hex() {
    let decoded = tiles("TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:1F8B\nEND_STREAM\n");
    assert_eq!(decoded[0].1, vec![0x1f, 0x8b]);
}

#[test]
fn test_lines_after_end_are_ignored() {
    let input = "TIPPECANOE_STREAM_V1\nmetadata:{}\nEND_STREAM\nnot part of the stream\n";
    let events = decode_all(input).unwrap();
    assert_eq!(events.last(), Some(&StreamEvent::End));
}

#[test]
fn test_metadata_fields_survive() {
    let input = "TIPPECANOE_STREAM_V1\n\
                 metadata:{\"name\":\"city\",\"attribution\":\"osm\",\"vector_layers\":[{\"id\":\"roads\",\"minzoom\":0,\"maxzoom\":5}]}\n\
                 END_STREAM\n";
    let metadata = StreamDecoder::new(input.as_bytes()).read_metadata().unwrap();
    assert_eq!(metadata.name.as_deref(), Some("city"));
    assert_eq!(metadata.extra["attribution"], "osm");
    assert_eq!(metadata.layer("roads").unwrap().maxzoom, 5);
}

// ============================================================================
// TRUNCATION
// ============================================================================

#[test]
fn test_missing_end_is_truncated() {
    let mut decoder =
        StreamDecoder::new("TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:aa\n".as_bytes());
    decoder.read_metadata().unwrap();
    assert!(decoder.next_tile().unwrap().is_some());
    assert!(decoder.next_tile().unwrap().is_none());
    assert!(decoder.is_truncated());
    assert_eq!(decoder.completion(), Some(Completion::Truncated));
    assert_eq!(decoder.tiles_read(), 1);
}

#[test]
fn test_end_is_complete() {
    let mut decoder =
        StreamDecoder::new("TIPPECANOE_STREAM_V1\nmetadata:{}\nEND_STREAM\n".as_bytes());
    decoder.read_metadata().unwrap();
    assert!(decoder.next_tile().unwrap().is_none());
    assert_eq!(decoder.completion(), Some(Completion::Complete));
}

// ============================================================================
// REJECTION
// ============================================================================

#[test]
fn test_empty_input() {
    assert!(matches!(
        decode_all(""),
        Err(ProtocolError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_wrong_header() {
    assert!(matches!(
        decode_all("TIPPECANOE_STREAM_V2\nmetadata:{}\n"),
        Err(ProtocolError::BadHeader { .. })
    ));
}

#[test]
fn test_missing_metadata() {
    assert!(matches!(
        decode_all("TIPPECANOE_STREAM_V1\n"),
        Err(ProtocolError::UnexpectedEof { .. })
    ));
    assert!(matches!(
        decode_all("TIPPECANOE_STREAM_V1\nTILE\n"),
        Err(ProtocolError::BadMetadata { line: 2, .. })
    ));
}

#[test]
fn test_invalid_metadata_json() {
    assert!(matches!(
        decode_all("TIPPECANOE_STREAM_V1\nmetadata:{not json\n"),
        Err(ProtocolError::BadMetadata { .. })
    ));
}

#[test]
fn test_tile_without_data() {
    let err = decode_all("TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\nTILE\n").unwrap_err();
    assert!(matches!(err, ProtocolError::BadTileRecord { line: 4, .. }));

    let err = decode_all("TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\n").unwrap_err();
    assert!(matches!(err, ProtocolError::BadTileRecord { .. }));
}

#[test]
fn test_invalid_hex() {
    for payload in ["zz", "abc"] {
        let input = format!("TIPPECANOE_STREAM_V1\nmetadata:{{}}\nTILE\ndata:{}\n", payload);
        assert!(
            matches!(decode_all(&input), Err(ProtocolError::BadTileRecord { .. })),
            "payload {:?} accepted",
            payload
        );
    }
}

#[test]
fn test_bad_explicit_coordinate() {
    for line in ["TILE 1/9/0", "TILE a/b/c", "TILEX"] {
        let input = format!("TIPPECANOE_STREAM_V1\nmetadata:{{}}\n{}\ndata:00\n", line);
        assert!(
            matches!(decode_all(&input), Err(ProtocolError::BadTileRecord { .. })),
            "{:?} accepted",
            line
        );
    }
}

#[test]
fn test_invalid_utf8_line() {
    let mut input = b"TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:".to_vec();
    input.extend_from_slice(&[0xff, 0xfe, b'\n']);
    let result: Result<Vec<_>, _> = StreamDecoder::new(input.as_slice()).collect();
    assert!(matches!(result, Err(ProtocolError::BadTileRecord { .. })));
}

// ============================================================================
// LINE PARSER STATES
// ============================================================================

#[test]
fn test_parser_state_transitions() {
    let mut parser = LineParser::new();
    assert_eq!(parser.state(), State::AwaitHeader);
    parser.step("TIPPECANOE_STREAM_V1").unwrap();
    assert_eq!(parser.state(), State::AwaitMetadata);
    parser.step("metadata:{}").unwrap();
    assert_eq!(parser.state(), State::Tiles);
    assert_eq!(parser.step("TILE").unwrap(), None);
    assert!(matches!(parser.state(), State::AwaitData(_)));
    assert!(matches!(parser.step("data:00").unwrap(), Some(StreamEvent::Tile(..))));
    assert_eq!(parser.state(), State::Tiles);
    assert_eq!(parser.finish().unwrap(), Completion::Truncated);
    assert_eq!(parser.state(), State::Ended);
}
