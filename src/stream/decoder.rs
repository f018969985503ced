// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Line-at-a-time stream decoder.
//!
//! [`LineParser`] is the whole protocol: one `step` per line, one explicit
//! [`State`], no lookahead. [`StreamDecoder`] just feeds it lines from a
//! `BufRead`, so it works on pipes and stdout without ever seeking.

use std::io::BufRead;

use super::{DATA_PREFIX, END_MARKER, METADATA_PREFIX, STREAM_HEADER, TILE_MARKER};
use crate::error::ProtocolError;
use crate::metadata::ArchiveMetadata;
use crate::tile::{TileCoord, TileId};

/// One decoded protocol element.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Header,
    Metadata(ArchiveMetadata),
    Tile(TileCoord, Vec<u8>),
    End,
}

/// Decoder position in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitHeader,
    AwaitMetadata,
    /// Between tile records.
    Tiles,
    /// A `TILE` line was read; its `data:` line must follow.
    AwaitData(TileCoord),
    /// `END_STREAM` was read, or the channel closed.
    Ended,
}

/// How a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// `END_STREAM` was seen.
    Complete,
    /// The channel closed in the tile section without `END_STREAM`.
    Truncated,
}

/// The protocol state machine.
#[derive(Debug)]
pub struct LineParser {
    state: State,
    /// Id a bare `TILE` line is assigned.
    next_id: TileId,
    line: u64,
    tiles: u64,
    completion: Option<Completion>,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// A parser whose first bare `TILE` gets `next_id`, for a stream that
    /// continues where an earlier chunk stopped.
    pub fn starting_at(next_id: TileId) -> Self {
        Self {
            state: State::AwaitHeader,
            next_id,
            line: 0,
            tiles: 0,
            completion: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Tiles emitted so far.
    pub fn tiles(&self) -> u64 {
        self.tiles
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    fn bad_tile(&self, reason: impl Into<String>) -> ProtocolError {
        ProtocolError::BadTileRecord {
            line: self.line,
            reason: reason.into(),
        }
    }

    /// Resolve the coordinate a `TILE` line announces.
    fn tile_coord(&self, line: &str) -> Result<TileCoord, ProtocolError> {
        if line == TILE_MARKER {
            return TileCoord::from_id(self.next_id)
                .map_err(|e| self.bad_tile(format!("no inferable coordinate: {}", e)));
        }
        let explicit = line
            .strip_prefix(TILE_MARKER)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(|| self.bad_tile(format!("expected TILE, got {:?}", truncate(line))))?;
        explicit
            .parse::<TileCoord>()
            .map_err(|e| self.bad_tile(e.to_string()))
    }

    /// Consume one line (without its terminator).
    pub fn step(&mut self, raw: &str) -> Result<Option<StreamEvent>, ProtocolError> {
        self.line += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        match self.state {
            State::AwaitHeader => {
                if line != STREAM_HEADER {
                    return Err(ProtocolError::BadHeader {
                        expected: STREAM_HEADER,
                        found: truncate(line).to_string(),
                    });
                }
                self.state = State::AwaitMetadata;
                Ok(Some(StreamEvent::Header))
            }
            State::AwaitMetadata => {
                let json = line.strip_prefix(METADATA_PREFIX).ok_or_else(|| {
                    ProtocolError::BadMetadata {
                        line: self.line,
                        reason: format!("missing {:?} prefix", METADATA_PREFIX),
                    }
                })?;
                let metadata: ArchiveMetadata =
                    serde_json::from_str(json.trim()).map_err(|e| ProtocolError::BadMetadata {
                        line: self.line,
                        reason: e.to_string(),
                    })?;
                self.state = State::Tiles;
                Ok(Some(StreamEvent::Metadata(metadata)))
            }
            State::Tiles => {
                if line.is_empty() {
                    return Ok(None);
                }
                if line == END_MARKER {
                    self.state = State::Ended;
                    self.completion = Some(Completion::Complete);
                    return Ok(Some(StreamEvent::End));
                }
                let coord = self.tile_coord(line)?;
                self.state = State::AwaitData(coord);
                Ok(None)
            }
            State::AwaitData(coord) => {
                let hex_payload = line.strip_prefix(DATA_PREFIX).ok_or_else(|| {
                    self.bad_tile(format!(
                        "TILE not followed by a data line (got {:?})",
                        truncate(line)
                    ))
                })?;
                let payload = hex::decode(hex_payload)
                    .map_err(|e| self.bad_tile(format!("invalid hex payload: {}", e)))?;
                self.next_id = coord.id() + 1;
                self.tiles += 1;
                self.state = State::Tiles;
                Ok(Some(StreamEvent::Tile(coord, payload)))
            }
            State::Ended => Ok(None),
        }
    }

    /// The channel closed. Decide whether that was legal.
    pub fn finish(&mut self) -> Result<Completion, ProtocolError> {
        let completion = match self.state {
            State::AwaitHeader => {
                return Err(ProtocolError::UnexpectedEof {
                    expected: "the stream header",
                })
            }
            State::AwaitMetadata => {
                return Err(ProtocolError::UnexpectedEof {
                    expected: "the metadata line",
                })
            }
            State::AwaitData(_) => {
                return Err(self.bad_tile("TILE not followed by a data line (end of stream)"))
            }
            State::Tiles => Completion::Truncated,
            State::Ended => Completion::Complete,
        };
        self.state = State::Ended;
        self.completion = Some(completion);
        Ok(completion)
    }
}

/// Keep error messages readable when a hex line is megabytes long.
fn truncate(line: &str) -> &str {
    const MAX: usize = 64;
    match line.char_indices().nth(MAX) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Pull decoder over any buffered byte channel.
///
/// ```
/// use pmstream::stream::{StreamDecoder, StreamEvent};
///
/// let input = "TIPPECANOE_STREAM_V1\nmetadata:{}\nTILE\ndata:1a2b\nEND_STREAM\n";
/// let events: Vec<_> = StreamDecoder::new(input.as_bytes())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert!(matches!(&events[2], StreamEvent::Tile(coord, data) if coord.z() == 0 && data == &[0x1a, 0x2b]));
/// ```
pub struct StreamDecoder<R> {
    reader: R,
    parser: LineParser,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> StreamDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_next_id(reader, 0)
    }

    /// Decode a chunk whose bare `TILE` records continue from `next_id`.
    pub fn with_next_id(reader: R, next_id: TileId) -> Self {
        Self {
            reader,
            parser: LineParser::starting_at(next_id),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Read up to and including the metadata line.
    pub fn read_metadata(&mut self) -> Result<ArchiveMetadata, ProtocolError> {
        loop {
            match self.next_event()? {
                Some(StreamEvent::Header) => continue,
                Some(StreamEvent::Metadata(metadata)) => return Ok(metadata),
                Some(other) => {
                    return Err(ProtocolError::BadMetadata {
                        line: self.parser.line,
                        reason: format!("metadata already consumed, got {:?}", other),
                    })
                }
                None => {
                    return Err(ProtocolError::UnexpectedEof {
                        expected: "the metadata line",
                    })
                }
            }
        }
    }

    /// Next tile, or `None` once the stream is over (complete or truncated).
    pub fn next_tile(&mut self) -> Result<Option<(TileCoord, Vec<u8>)>, ProtocolError> {
        loop {
            match self.next_event()? {
                Some(StreamEvent::Tile(coord, payload)) => return Ok(Some((coord, payload))),
                Some(StreamEvent::End) | None => return Ok(None),
                Some(StreamEvent::Header | StreamEvent::Metadata(_)) => continue,
            }
        }
    }

    /// Next protocol event. `Ok(None)` at the end of the channel.
    pub fn next_event(&mut self) -> Result<Option<StreamEvent>, ProtocolError> {
        while !self.done {
            if self.parser.state() == State::Ended {
                // Whatever follows END_STREAM is ignored.
                self.done = true;
                break;
            }

            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                self.done = true;
                if self.parser.finish()? == Completion::Truncated {
                    tracing::warn!(
                        tiles = self.parser.tiles(),
                        "stream closed without END_STREAM; keeping the tiles received"
                    );
                }
                break;
            }

            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
            }
            let line = std::str::from_utf8(&self.buf).map_err(|_| match self.parser.state() {
                State::AwaitHeader => ProtocolError::BadHeader {
                    expected: STREAM_HEADER,
                    found: String::from_utf8_lossy(&self.buf[..self.buf.len().min(64)]).into_owned(),
                },
                State::AwaitMetadata => ProtocolError::BadMetadata {
                    line: self.parser.line + 1,
                    reason: "line is not valid UTF-8".into(),
                },
                _ => ProtocolError::BadTileRecord {
                    line: self.parser.line + 1,
                    reason: "line is not valid UTF-8".into(),
                },
            })?;

            if let Some(event) = self.parser.step(line)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// True once the channel closed without `END_STREAM`.
    pub fn is_truncated(&self) -> bool {
        self.parser.completion() == Some(Completion::Truncated)
    }

    pub fn completion(&self) -> Option<Completion> {
        self.parser.completion()
    }

    pub fn tiles_read(&self) -> u64 {
        self.parser.tiles()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for StreamDecoder<R> {
    type Item = Result<StreamEvent, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
