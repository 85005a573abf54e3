// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quadtree tile addressing for the raster/2D tile loader.
//!
//! Indices cross the boundary as `u32` (a plain JS number); deeper tiles
//! than fit are rejected.

use lmv_core::{TileCoords, MAX_LEVEL};
use wasm_bindgen::prelude::*;

/// Tile coordinates (level, x, y) exposed to JavaScript
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct TileIndex {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl From<TileCoords> for TileIndex {
    fn from(t: TileCoords) -> Self {
        Self {
            level: t.level,
            x: t.x,
            y: t.y,
        }
    }
}

impl From<TileIndex> for TileCoords {
    fn from(t: TileIndex) -> Self {
        TileCoords::new(t.level, t.x, t.y)
    }
}

#[wasm_bindgen]
impl TileIndex {
    #[wasm_bindgen(constructor)]
    pub fn new(level: u32, x: u32, y: u32) -> TileIndex {
        TileIndex { level, x, y }
    }

    /// Create from a breadth-first index
    #[wasm_bindgen(js_name = fromIndex)]
    pub fn from_index(index: u32) -> TileIndex {
        lmv_core::index_to_tile(u64::from(index)).into()
    }

    /// Breadth-first index of this tile
    #[wasm_bindgen(js_name = toIndex)]
    pub fn to_index(&self) -> Result<u32, JsValue> {
        tile_index_u32(TileCoords::from(*self)).map_err(|msg| JsValue::from_str(&msg))
    }

    /// Child 0..3 (bit 0 = x offset, bit 1 = y offset)
    #[wasm_bindgen(js_name = getChild)]
    pub fn get_child(&self, n: u32) -> Result<TileIndex, JsValue> {
        if n > 3 {
            return Err(JsValue::from_str(&format!("child number {n} out of range")));
        }
        if self.level >= MAX_LEVEL {
            return Err(JsValue::from_str(&format!(
                "tile level {} has no addressable children",
                self.level
            )));
        }
        Ok(TileCoords::from(*self).get_child(n).into())
    }

    /// Parent tile, or undefined at level 0
    #[wasm_bindgen(js_name = getParent)]
    pub fn get_parent(&self) -> Option<TileIndex> {
        TileCoords::from(*self).get_parent().map(Into::into)
    }

    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self) -> bool {
        TileCoords::from(*self).is_valid()
    }

    /// Tiles per axis at `level`
    #[wasm_bindgen(js_name = tilesAtLevel)]
    pub fn tiles_at_level(level: u32) -> f64 {
        lmv_core::tiles_at_level(level.min(MAX_LEVEL)) as f64
    }
}

fn tile_index_u32(tile: TileCoords) -> Result<u32, String> {
    let index = tile
        .try_to_index()
        .ok_or_else(|| format!("tile {tile} is outside the quadtree"))?;
    u32::try_from(index).map_err(|_| format!("tile index {index} exceeds 32 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fits_u32() {
        assert_eq!(tile_index_u32(TileCoords::new(2, 3, 1)), Ok(12));
    }

    #[test]
    fn deep_tiles_are_rejected() {
        let deep = TileCoords::new(MAX_LEVEL, 0, 0).get_child(0);
        assert!(tile_index_u32(deep).is_err());
        assert!(tile_index_u32(TileCoords::new(17, 0, 0)).is_err());
        assert!(tile_index_u32(TileCoords::new(2, 9, 0)).is_err());
    }
}
