// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the pmstream command-line interface.
//!
//! Two subcommands: `assemble` reads one or more tile streams (a file, a
//! named pipe, or `-` for stdin) and writes an archive; `inspect` prints an
//! archive's header, metadata and directory summary, or looks up one tile.

pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use pmstream::{Compression, TileCoord};

#[derive(Parser)]
#[command(
    name = "pmstream",
    about = "Assemble streamed tiles into a PMTiles archive",
    version
)]
pub struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "pmstream=trace"
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an archive from TIPPECANOE_STREAM_V1 input
    Assemble {
        /// Stream source; repeat for chunked output. "-" reads stdin
        #[arg(short, long, default_value = "-", num_args = 1..)]
        input: Vec<String>,

        /// Archive to write (replaced atomically)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON config file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Archive name, replacing the stream's
        #[arg(long)]
        name: Option<String>,

        /// Compression for metadata and directories
        #[arg(long, value_enum)]
        internal_compression: Option<InternalCompression>,

        /// Store identical payloads once (default on)
        #[arg(long)]
        no_dedup: bool,

        /// Entry count above which directories are split into leaves
        #[arg(long)]
        leaf_threshold: Option<usize>,

        /// Fail instead of writing a partial archive when a stream is truncated
        #[arg(long)]
        strict: bool,
    },

    /// Inspect an archive
    Inspect {
        /// Path to archive
        file: PathBuf,

        /// Look up one tile, as z/x/y
        #[arg(long)]
        tile: Option<TileCoord>,

        /// List every directory entry
        #[arg(long)]
        entries: bool,
    },
}

/// The codecs the writer can apply.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InternalCompression {
    None,
    Gzip,
    Brotli,
}

impl From<InternalCompression> for Compression {
    fn from(value: InternalCompression) -> Self {
        match value {
            InternalCompression::None => Compression::None,
            InternalCompression::Gzip => Compression::Gzip,
            InternalCompression::Brotli => Compression::Brotli,
        }
    }
}
