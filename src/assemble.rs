// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The whole pipeline: streams in, archive out.
//!
//! An [`Assembler`] takes one or more streams (a generator may split its
//! output into chunks, each with its own header and metadata line). Metadata
//! fragments are merged, tiles go straight into the directory builder, and
//! the archive is serialized once every stream is drained. Tile ids must keep
//! increasing across chunk boundaries, exactly as within one stream, and a
//! bare `TILE` at the start of a chunk takes the id after the last one stored.
//!
//! Output is fail closed. A protocol or ordering error aborts before any file
//! exists, and poisons the assembler: every later `ingest` or `finish` returns
//! [`AssembleError::Aborted`]. The file itself is written to a temporary
//! sibling and renamed into place only once complete, so a reader never sees
//! half an archive. A stream
//! cut off without `END_STREAM` still yields an archive, but one whose metadata
//! carries `"partial": true`, and [`AssembleReport::truncated`] says so.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::archive::{self, Header};
use crate::config::AssemblerConfig;
use crate::directory::{BuilderStats, DirectoryBuilder};
use crate::error::AssembleError;
use crate::metadata::{ArchiveMetadata, MergeConflict, MetadataAggregator};
use crate::stream::{Completion, StreamDecoder};

/// What an assembly run produced.
#[derive(Debug, Clone)]
pub struct AssembleReport {
    /// At least one stream ended without `END_STREAM` (stream truncated).
    /// The archive is marked partial.
    pub truncated: bool,
    pub streams: usize,
    /// Tile records decoded, before run-length and duplicate reduction.
    pub tiles_received: u64,
    pub stats: BuilderStats,
    pub conflicts: Vec<MergeConflict>,
    pub leaf_directories: usize,
    pub header: Header,
}

impl AssembleReport {
    pub fn archive_size(&self) -> u64 {
        self.header.sections().total_size()
    }
}

#[derive(Debug)]
pub struct Assembler {
    config: AssemblerConfig,
    aggregator: MetadataAggregator,
    builder: DirectoryBuilder,
    streams: usize,
    tiles_received: u64,
    truncated: bool,
    failed: bool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        let builder = DirectoryBuilder::new(config.dedup);
        Self {
            config,
            aggregator: MetadataAggregator::new(),
            builder,
            streams: 0,
            tiles_received: 0,
            truncated: false,
            failed: false,
        }
    }

    /// Drain one stream into the archive under construction.
    ///
    /// An error here is final: the assembler refuses further input and will
    /// not produce an archive from the tiles accepted before the failure.
    pub fn ingest<R: BufRead>(&mut self, reader: R) -> Result<Completion, AssembleError> {
        self.ingest_with_progress(reader, |_| {})
    }

    /// [`ingest`](Self::ingest), calling `progress` with the running tile
    /// count after every tile.
    pub fn ingest_with_progress<R, F>(
        &mut self,
        reader: R,
        progress: F,
    ) -> Result<Completion, AssembleError>
    where
        R: BufRead,
        F: FnMut(u64),
    {
        if self.failed {
            return Err(AssembleError::Aborted);
        }
        let result = self.drain(reader, progress);
        if let Err(e) = &result {
            self.failed = true;
            tracing::error!(stream = self.streams, error = %e, "stream rejected, assembly aborted");
        }
        result
    }

    fn drain<R, F>(&mut self, reader: R, mut progress: F) -> Result<Completion, AssembleError>
    where
        R: BufRead,
        F: FnMut(u64),
    {
        let next_id = self.builder.last_id().map_or(0, |id| id + 1);
        let mut decoder = StreamDecoder::with_next_id(reader, next_id);
        let metadata = decoder.read_metadata()?;
        self.aggregator.add(metadata);
        self.streams += 1;

        while let Some((coord, payload)) = decoder.next_tile()? {
            self.builder.append(coord, &payload)?;
            self.tiles_received += 1;
            progress(self.tiles_received);
        }

        let completion = decoder.completion().unwrap_or(Completion::Complete);
        if completion == Completion::Truncated {
            self.truncated = true;
        }
        tracing::debug!(
            stream = self.streams,
            tiles = decoder.tiles_read(),
            ?completion,
            "stream drained"
        );
        Ok(completion)
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// True once an `ingest` has failed.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn stats(&self) -> BuilderStats {
        self.builder.stats()
    }

    /// Metadata merged from the streams read so far.
    pub fn metadata(&self) -> Option<&ArchiveMetadata> {
        self.aggregator.current()
    }

    /// Serialize the archive into memory.
    pub fn finish(self) -> Result<(Vec<u8>, AssembleReport), AssembleError> {
        let mut out = Vec::new();
        let report = self.finish_to(&mut out)?;
        Ok((out, report))
    }

    /// Serialize the archive into `w`.
    pub fn finish_to<W: Write>(self, w: &mut W) -> Result<AssembleReport, AssembleError> {
        if self.failed {
            return Err(AssembleError::Aborted);
        }
        let conflicts = self.aggregator.conflicts().to_vec();
        let mut metadata = self.aggregator.finish();
        if let Some(name) = &self.config.name {
            metadata.name = Some(name.clone());
        }

        let tiles = self.builder.finalize();
        let options = self.config.write_options(self.truncated);
        let prepared = archive::prepare(&metadata, &tiles, &options)?;
        prepared.write_to(w)?;

        let report = AssembleReport {
            truncated: self.truncated,
            streams: self.streams,
            tiles_received: self.tiles_received,
            stats: tiles.stats,
            conflicts,
            leaf_directories: prepared.leaf_count(),
            header: prepared.header.clone(),
        };
        tracing::info!(
            tiles = report.stats.addressed_tiles,
            entries = report.stats.tile_entries,
            contents = report.stats.tile_contents,
            leaves = report.leaf_directories,
            bytes = report.archive_size(),
            partial = report.truncated,
            "archive assembled"
        );
        Ok(report)
    }

    /// Write the archive to `path` atomically.
    pub fn finish_to_file(self, path: &Path) -> Result<AssembleReport, AssembleError> {
        if self.failed {
            return Err(AssembleError::Aborted);
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropped (and deleted) on any early return below.
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        let report = {
            let mut w = std::io::BufWriter::new(temp.as_file_mut());
            let report = self.finish_to(&mut w)?;
            w.flush()?;
            report
        };
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| AssembleError::Io(e.error))?;
        Ok(report)
    }
}

/// Assemble a single stream into memory.
pub fn assemble<R: BufRead>(
    reader: R,
    config: &AssemblerConfig,
) -> Result<(Vec<u8>, AssembleReport), AssembleError> {
    let mut assembler = Assembler::new(config.clone());
    assembler.ingest(reader)?;
    assembler.finish()
}

/// Assemble a single stream into a file. No file is created if the stream is
/// malformed or out of order.
pub fn assemble_to_file<R: BufRead>(
    reader: R,
    path: &Path,
    config: &AssemblerConfig,
) -> Result<AssembleReport, AssembleError> {
    let mut assembler = Assembler::new(config.clone());
    assembler.ingest(reader)?;
    assembler.finish_to_file(path)
}
