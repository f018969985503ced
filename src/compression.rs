// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Section compression codes and codecs.
//!
//! The archive header stores one code for its own structures (metadata and
//! directories) and one for tile payloads. Payloads arrive already compressed,
//! so only the internal code is ever applied here.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

/// Gzip member magic, used to sniff compressed metadata.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Brotli quality for directories and metadata (small inputs, so max quality is cheap).
const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Unknown,
    None,
    #[default]
    Gzip,
    Brotli,
    Zstd,
}

impl Compression {
    /// Header byte for this code.
    pub fn code(self) -> u8 {
        match self {
            Compression::Unknown => 0,
            Compression::None => 1,
            Compression::Gzip => 2,
            Compression::Brotli => 3,
            Compression::Zstd => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Compression::Unknown,
            1 => Compression::None,
            2 => Compression::Gzip,
            3 => Compression::Brotli,
            4 => Compression::Zstd,
            _ => return None,
        })
    }

    /// Whether this crate can apply the codec itself.
    pub fn is_supported(self) -> bool {
        matches!(self, Compression::None | Compression::Gzip | Compression::Brotli)
    }

    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(
                    Vec::with_capacity(data.len() / 2 + 32),
                    flate2::Compression::default(),
                );
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Brotli => {
                let mut out = Vec::with_capacity(data.len() / 2 + 32);
                {
                    let mut writer =
                        brotli::CompressorWriter::new(&mut out, 4096, BROTLI_QUALITY, BROTLI_WINDOW);
                    writer.write_all(data)?;
                    writer.flush()?;
                }
                Ok(out)
            }
            Compression::Unknown | Compression::Zstd => Err(unsupported(self)),
        }
    }

    pub fn decompress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(data).read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::Brotli => {
                let mut out = Vec::new();
                brotli::Decompressor::new(data, 4096).read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::Unknown | Compression::Zstd => Err(unsupported(self)),
        }
    }
}

fn unsupported(compression: Compression) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{:?} compression is not supported", compression),
    )
}

/// Tile payload format recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Unknown,
    #[default]
    Mvt,
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl TileType {
    pub fn code(self) -> u8 {
        match self {
            TileType::Unknown => 0,
            TileType::Mvt => 1,
            TileType::Png => 2,
            TileType::Jpeg => 3,
            TileType::Webp => 4,
            TileType::Avif => 5,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TileType::Mvt,
            2 => TileType::Png,
            3 => TileType::Jpeg,
            4 => TileType::Webp,
            5 => TileType::Avif,
            _ => TileType::Unknown,
        }
    }

    /// Guess from the metadata `format` key (tippecanoe writes "pbf").
    pub fn from_format(format: &str) -> Self {
        match format.to_ascii_lowercase().as_str() {
            "pbf" | "mvt" => TileType::Mvt,
            "png" => TileType::Png,
            "jpg" | "jpeg" => TileType::Jpeg,
            "webp" => TileType::Webp,
            "avif" => TileType::Avif,
            _ => TileType::Unknown,
        }
    }
}
