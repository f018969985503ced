// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tile coordinates and their tile ids.
//!
//! A [`TileCoord`] is validated at construction, so every coordinate in the
//! pipeline has a tile id. Conversions in both directions go through
//! [`hilbert`].

pub mod hilbert;

use std::fmt;
use std::str::FromStr;

use crate::error::CoordError;

pub use hilbert::{id_to_zxy, zxy_to_id, MAX_ZOOM};

/// Position of a tile on the Hilbert-ordered pyramid.
pub type TileId = u64;

/// A (zoom, column, row) triple in the XYZ tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    z: u8,
    x: u32,
    y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::ZoomTooLarge(z));
        }
        let n = 1u64 << z;
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(CoordError::OutOfRange { z, x, y });
        }
        Ok(Self { z, x, y })
    }

    pub fn from_id(id: TileId) -> Result<Self, CoordError> {
        let (z, x, y) = id_to_zxy(id)?;
        Ok(Self { z, x, y })
    }

    #[inline]
    pub fn z(&self) -> u8 {
        self.z
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Hilbert tile id. Infallible because construction validated the range.
    pub fn id(&self) -> TileId {
        match zxy_to_id(self.z, self.x, self.y) {
            Ok(id) => id,
            Err(_) => unreachable!("TileCoord is validated at construction"),
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Parse error for the `z/x/y` text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCoordError {
    #[error("expected z/x/y, got {0:?}")]
    Syntax(String),
    #[error(transparent)]
    Range(#[from] CoordError),
}

impl FromStr for TileCoord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        let syntax = || ParseCoordError::Syntax(s.to_string());
        let z = parts.next().and_then(|p| p.parse::<u8>().ok()).ok_or_else(syntax)?;
        let x = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(syntax)?;
        let y = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(syntax)?;
        if parts.next().is_some() {
            return Err(syntax());
        }
        Ok(TileCoord::new(z, x, y)?)
    }
}
