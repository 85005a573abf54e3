// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LMV-Lite WebAssembly Bindings
//!
//! JavaScript/TypeScript API over the instance tree, built with wasm-bindgen.
//! The property-database loader feeds an [`InstanceTreeBuilder`] inside a
//! worker, ships the flattened tree to the main thread with `toBytes()`, and
//! the renderer queries it through [`InstanceTree`].

use wasm_bindgen::prelude::*;

mod tiles;
mod tree;
mod utils;

pub use tiles::TileIndex;
pub use tree::{InstanceTree, InstanceTreeBuilder};
pub use utils::set_panic_hook as init_panic_hook;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
}

/// Get the version of LMV-Lite
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
