//! Deterministic terrain generation.
//!
//! The grid is a pure function of the world seed: the same seed always
//! yields the same terrain, independent of any theme content layered on
//! top. Each tile's terrain is drawn from a weighted distribution using a
//! `xorshift64` value mixed from `(seed, x, y)`.

use dominion_types::{Terrain, Tile};

/// Weighted terrain distribution, summing to 100.
///
/// Plains dominate so that settlements nearly always have somewhere
/// sensible to stand.
const TERRAIN_WEIGHTS: &[(Terrain, u64)] = &[
    (Terrain::Plains, 35),
    (Terrain::Forest, 25),
    (Terrain::Hills, 15),
    (Terrain::Mountains, 10),
    (Terrain::Water, 10),
    (Terrain::Desert, 5),
];

/// Generate the full tile grid for a `width` x `height` world.
///
/// Tiles are produced row-major with no location linkage or ownership;
/// genesis overlays settlements afterwards.
pub fn generate_grid(seed: u64, width: u32, height: u32) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity((width as usize).saturating_mul(height as usize));
    for y in 0..height {
        for x in 0..width {
            tiles.push(Tile {
                x,
                y,
                terrain: terrain_at(seed, x, y),
                location_id: None,
                owner: None,
            });
        }
    }
    tiles
}

/// The terrain of a single tile, derived from `(seed, x, y)` alone.
pub fn terrain_at(seed: u64, x: u32, y: u32) -> Terrain {
    let roll = deterministic_random(seed, u64::from(x), u64::from(y)).checked_rem(100).unwrap_or(0);

    let mut cumulative: u64 = 0;
    for &(terrain, weight) in TERRAIN_WEIGHTS {
        cumulative = cumulative.saturating_add(weight);
        if roll < cumulative {
            return terrain;
        }
    }
    Terrain::Plains
}

/// Deterministic pseudo-random number generator using `xorshift64`.
///
/// Combines the world seed and tile coordinates with a mixing step so the
/// same inputs always produce the same output.
const fn deterministic_random(seed: u64, x: u64, y: u64) -> u64 {
    // 0x517cc1b727220a95 is a well-known mixing constant.
    let mut state = seed
        .wrapping_add(x.wrapping_mul(0x517c_c1b7_2722_0a95))
        .wrapping_add(y.wrapping_mul(0x9e37_79b9_7f4a_7c15));

    // xorshift requires non-zero input.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_width_times_height_tiles() {
        let tiles = generate_grid(42, 8, 6);
        assert_eq!(tiles.len(), 48);
    }

    #[test]
    fn grid_is_row_major() {
        let tiles = generate_grid(42, 4, 3);
        let tile = tiles.get(5);
        assert_eq!(tile.map(|t| (t.x, t.y)), Some((1, 1)));
    }

    #[test]
    fn same_seed_same_terrain() {
        let a = generate_grid(7, 16, 16);
        let b = generate_grid(7, 16, 16);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generate_grid(7, 16, 16);
        let b = generate_grid(8, 16, 16);
        assert_ne!(a, b);
    }

    #[test]
    fn tiles_start_unowned_and_unsettled() {
        let tiles = generate_grid(1, 5, 5);
        assert!(tiles.iter().all(|t| t.owner.is_none() && t.location_id.is_none()));
    }

    #[test]
    fn weights_sum_to_one_hundred() {
        let total: u64 = TERRAIN_WEIGHTS.iter().map(|&(_, w)| w).sum();
        assert_eq!(total, 100);
    }
}
