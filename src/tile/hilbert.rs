// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Hilbert curve ordering of the tile pyramid.
//!
//! Every tile of every zoom level gets one u64. Zoom levels are laid out end to
//! end (level z starts at `(4^z - 1) / 3`, the number of tiles in all lower
//! levels) and within a level tiles follow a Hilbert curve, so neighbouring ids
//! are neighbouring tiles. That locality is what makes run-length entries and
//! delta-encoded directories small.
//!
//! # References
//!
//! - **Hilbert curve (xy2d / d2xy)**: the iterative quadrant-rotation form
//!   popularised by Warren, "Hacker's Delight" (2nd ed.), §16-2.
//! - **PMTiles v3 TileID**: <https://github.com/protomaps/PMTiles/blob/main/spec/v3/spec.md>

use super::TileId;
use crate::error::CoordError;

/// Highest zoom level addressable with a u64 tile id.
pub const MAX_ZOOM: u8 = 31;

/// First tile id of zoom level `z` (count of tiles in levels `0..z`).
#[inline]
pub fn zoom_base(z: u8) -> TileId {
    ((1u64 << (2 * u32::from(z))) - 1) / 3
}

/// Tiles in zoom level `z`.
#[inline]
fn level_size(z: u8) -> TileId {
    1u64 << (2 * u32::from(z))
}

#[inline]
fn rotate(n: u64, x: &mut u64, y: &mut u64, rx: u64, ry: u64) {
    if ry == 0 {
        if rx == 1 {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

/// Map (z, x, y) to its tile id.
///
/// Fails if `z > 31` or the column/row lies outside the level.
pub fn zxy_to_id(z: u8, x: u32, y: u32) -> Result<TileId, CoordError> {
    if z > MAX_ZOOM {
        return Err(CoordError::ZoomTooLarge(z));
    }
    let n = 1u64 << z;
    let (mut tx, mut ty) = (u64::from(x), u64::from(y));
    if tx >= n || ty >= n {
        return Err(CoordError::OutOfRange { z, x, y });
    }

    let mut d: u64 = 0;
    let mut s = n / 2;
    while s > 0 {
        let rx = u64::from(tx & s > 0);
        let ry = u64::from(ty & s > 0);
        d += s * s * ((3 * rx) ^ ry);
        rotate(n, &mut tx, &mut ty, rx, ry);
        s /= 2;
    }

    Ok(zoom_base(z) + d)
}

/// Map a tile id back to (z, x, y).
pub fn id_to_zxy(id: TileId) -> Result<(u8, u32, u32), CoordError> {
    let mut base: TileId = 0;
    for z in 0..=MAX_ZOOM {
        let size = level_size(z);
        if id - base < size {
            let (x, y) = position_on_level(z, id - base);
            return Ok((z, x, y));
        }
        base += size;
    }
    Err(CoordError::IdTooLarge(id))
}

fn position_on_level(z: u8, pos: u64) -> (u32, u32) {
    let n = 1u64 << z;
    let (mut x, mut y) = (0u64, 0u64);
    let mut t = pos;
    let mut s = 1u64;
    while s < n {
        let rx = 1 & (t / 2);
        let ry = 1 & (t ^ rx);
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        t /= 4;
        s *= 2;
    }
    (x as u32, y as u32)
}
