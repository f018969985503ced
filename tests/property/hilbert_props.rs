//! Property tests for the Hilbert tile id mapping.

use proptest::prelude::*;

use pmstream::tile::hilbert::zoom_base;
use pmstream::tile::{id_to_zxy, zxy_to_id};
use pmstream::TileCoord;

/// A valid (z, x, y) at zoom 0-31.
fn coord_strategy() -> impl Strategy<Value = (u8, u32, u32)> {
    (0u8..=31).prop_flat_map(|z| {
        let n = 1u64 << z;
        (Just(z), 0..n, 0..n).prop_map(|(z, x, y)| (z, x as u32, y as u32))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Property: id_to_zxy inverts zxy_to_id.
    #[test]
    fn prop_hilbert_bijection((z, x, y) in coord_strategy()) {
        let id = zxy_to_id(z, x, y).unwrap();
        prop_assert_eq!(id_to_zxy(id).unwrap(), (z, x, y));
    }

    /// Property: ids of zoom z lie in [base(z), base(z + 1)).
    #[test]
    fn prop_ids_grouped_by_zoom((z, x, y) in coord_strategy()) {
        let id = zxy_to_id(z, x, y).unwrap();
        prop_assert!(id >= zoom_base(z));
        if z < 31 {
            prop_assert!(id < zoom_base(z + 1));
        }
    }

    /// Property: every id up to zoom 31 maps to a coordinate and back.
    #[test]
    fn prop_id_roundtrip(id in 0u64..zoom_base(31) + (1u64 << 62)) {
        let coord = TileCoord::from_id(id).unwrap();
        prop_assert_eq!(coord.id(), id);
    }

    /// Property: neighbouring ids on a level are adjacent tiles.
    #[test]
    fn prop_consecutive_ids_are_neighbours(z in 1u8..=20, pos in any::<u64>()) {
        let size = 1u64 << (2 * z as u32);
        let pos = pos % (size - 1);
        let (_, x0, y0) = id_to_zxy(zoom_base(z) + pos).unwrap();
        let (_, x1, y1) = id_to_zxy(zoom_base(z) + pos + 1).unwrap();
        let distance = (x0 as i64 - x1 as i64).abs() + (y0 as i64 - y1 as i64).abs();
        prop_assert_eq!(distance, 1);
    }
}
