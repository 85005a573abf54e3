// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quadtree tile addressing.
//!
//! Tiles of a complete quadtree rooted at `(0, 0, 0)` are numbered
//! breadth-first: the root is 0, level 1 holds 1..5, level 2 holds 5..21,
//! and within a level tiles are row-major (`y * 2^level + x`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deepest level whose indices fit in a `u64`.
pub const MAX_LEVEL: u32 = 31;

/// Quadtree tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileCoords {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoords {
    pub const ROOT: TileCoords = TileCoords { level: 0, x: 0, y: 0 };

    pub fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// Child `n` in `0..4`: bit 0 selects the x offset, bit 1 the y offset.
    ///
    /// Children of a [`MAX_LEVEL`] tile have no index.
    #[inline]
    pub fn get_child(&self, n: u32) -> TileCoords {
        debug_assert!(n < 4, "quadtree child number {n} out of range");
        TileCoords {
            level: self.level + 1,
            x: 2 * self.x + (n & 1),
            y: 2 * self.y + ((n >> 1) & 1),
        }
    }

    /// All four children, in child-number order.
    pub fn children(&self) -> [TileCoords; 4] {
        [0, 1, 2, 3].map(|n| self.get_child(n))
    }

    /// Parent tile, or `None` for the root level.
    #[inline]
    pub fn get_parent(&self) -> Option<TileCoords> {
        if self.level == 0 {
            return None;
        }
        Some(TileCoords {
            level: self.level - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Whether x and y lie inside the level's grid.
    pub fn is_valid(&self) -> bool {
        if self.level > MAX_LEVEL {
            return false;
        }
        let n = tiles_at_level(self.level);
        u64::from(self.x) < n && u64::from(self.y) < n
    }

    /// Breadth-first index of this tile.
    ///
    /// # Panics
    ///
    /// If the level is deeper than [`MAX_LEVEL`].
    #[inline]
    pub fn to_index(&self) -> u64 {
        tile_to_index(self)
    }

    /// Breadth-first index, or `None` for tiles outside the grid or deeper
    /// than [`MAX_LEVEL`].
    #[inline]
    pub fn try_to_index(&self) -> Option<u64> {
        checked_tile_to_index(self)
    }
}

impl fmt::Display for TileCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.level, self.x, self.y)
    }
}

/// Tiles per axis at `level`.
#[inline]
pub fn tiles_at_level(level: u32) -> u64 {
    1u64 << level
}

/// Number of tiles in levels `0..level`: `(4^level - 1) / 3`.
#[inline]
fn tiles_above(level: u32) -> u64 {
    ((1u64 << (2 * level)) - 1) / 3
}

/// Breadth-first index of `tile` in a complete quadtree.
///
/// # Panics
///
/// If `tile.level` is deeper than [`MAX_LEVEL`]; use
/// [`checked_tile_to_index`] for untrusted tiles.
#[inline]
pub fn tile_to_index(tile: &TileCoords) -> u64 {
    assert!(
        tile.level <= MAX_LEVEL,
        "tile level {} exceeds MAX_LEVEL {}",
        tile.level,
        MAX_LEVEL
    );
    tiles_above(tile.level) + u64::from(tile.y) * tiles_at_level(tile.level) + u64::from(tile.x)
}

/// Checked [`tile_to_index`]: `None` unless [`TileCoords::is_valid`].
pub fn checked_tile_to_index(tile: &TileCoords) -> Option<u64> {
    tile.is_valid().then(|| tile_to_index(tile))
}

/// Inverse of [`tile_to_index`].
pub fn index_to_tile(index: u64) -> TileCoords {
    let mut level = 0;
    while level < MAX_LEVEL && tiles_above(level + 1) <= index {
        level += 1;
    }

    let local = index - tiles_above(level);
    let side = tiles_at_level(level);
    TileCoords {
        level,
        x: (local % side) as u32,
        y: (local / side) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_offsets() {
        assert_eq!(tile_to_index(&TileCoords::ROOT), 0);
        assert_eq!(tile_to_index(&TileCoords::new(1, 0, 0)), 1);
        assert_eq!(tile_to_index(&TileCoords::new(2, 0, 0)), 5);
        assert_eq!(tile_to_index(&TileCoords::new(3, 0, 0)), 21);
        assert_eq!(tile_to_index(&TileCoords::new(4, 0, 0)), 85);
    }

    #[test]
    fn known_tile() {
        let tile = TileCoords::new(2, 3, 1);
        assert_eq!(tile.to_index(), 12);
        assert_eq!(index_to_tile(12), tile);
    }

    #[test]
    fn index_round_trip_levels_0_to_4() {
        for i in 0..341u64 {
            let tile = index_to_tile(i);
            assert!(tile.is_valid(), "{tile} invalid for index {i}");
            assert_eq!(tile_to_index(&tile), i);
        }
        assert_eq!(index_to_tile(340), TileCoords::new(4, 15, 15));
        assert_eq!(index_to_tile(341), TileCoords::new(5, 0, 0));
    }

    #[test]
    fn children_and_parent() {
        let tile = TileCoords::new(1, 1, 0);
        let children = tile.children();
        assert_eq!(children[0], TileCoords::new(2, 2, 0));
        assert_eq!(children[1], TileCoords::new(2, 3, 0));
        assert_eq!(children[2], TileCoords::new(2, 2, 1));
        assert_eq!(children[3], TileCoords::new(2, 3, 1));
        for child in children {
            assert_eq!(child.get_parent(), Some(tile));
        }
        assert_eq!(TileCoords::ROOT.get_parent(), None);
    }

    #[test]
    fn validity_and_display() {
        assert!(TileCoords::new(2, 3, 3).is_valid());
        assert!(!TileCoords::new(2, 4, 0).is_valid());
        assert!(!TileCoords::new(40, 0, 0).is_valid());
        assert_eq!(TileCoords::new(2, 3, 1).to_string(), "(2, 3, 1)");
    }

    #[test]
    fn levels_past_max_have_no_index() {
        let deep = TileCoords::new(MAX_LEVEL, 0, 0).get_child(0);
        assert_eq!(deep.level, 32);
        assert_eq!(checked_tile_to_index(&deep), None);
        assert_eq!(deep.try_to_index(), None);
        assert_eq!(TileCoords::new(2, 4, 0).try_to_index(), None);
        assert_eq!(TileCoords::new(2, 3, 1).try_to_index(), Some(12));
    }

    #[test]
    #[should_panic(expected = "exceeds MAX_LEVEL")]
    fn unchecked_index_past_max_level_panics() {
        tile_to_index(&TileCoords::new(MAX_LEVEL + 1, 0, 0));
    }

    #[test]
    fn deep_levels_do_not_overflow() {
        let tile = TileCoords::new(MAX_LEVEL, 5, 7);
        assert_eq!(index_to_tile(tile.to_index()), tile);
    }
}
