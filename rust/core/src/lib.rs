// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # LMV-Lite Core
//!
//! Compact scene-graph storage for a CAD/BIM model viewer.
//!
//! ## Overview
//!
//! - **Instance tree**: a [`NodeArray`] builder is fed one node at a time by
//!   the hierarchy loader, then flattened into fixed-stride integer buffers
//!   ([`FlatNodeArray`]) and wrapped by [`InstanceTreeAccess`] for O(1)
//!   queries by dbId.
//! - **Name compression**: `"Basic Wall [184224]"`-style names share a pooled
//!   base string, see [`names`].
//! - **Transfer**: the flattened tree encodes to a single blob for worker
//!   hand-off, see [`serialization`].
//! - **[`SortedList`]**: rank-addressable sorted container.
//! - **Tiles**: breadth-first quadtree addressing, see [`tile`].
//!
//! ## Quick Start
//!
//! ```rust
//! use lmv_core::{InstanceTreeAccess, NodeArray};
//!
//! let mut builder = NodeArray::new(3, 3);
//! builder.set_node(1, 0, "Model", 0, &[2, 3], false)?;
//! builder.set_node(2, 1, "Base Wall [12345]", 0, &[100, 101], true)?;
//! builder.set_node(3, 1, "Door", 0, &[102], true)?;
//!
//! let tree = InstanceTreeAccess::new(builder.flatten(), 1, None)?;
//! assert_eq!(tree.get_parent_id(2), 1);
//! assert_eq!(tree.name(2), "Base Wall [12345]");
//! # Ok::<(), lmv_core::Error>(())
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod flags;
pub mod names;
pub mod node_array;
pub mod serialization;
pub mod sorted_list;
pub mod string_pool;
pub mod tile;

pub use access::{Children, InstanceTreeAccess, NodeContents, BOX_STRIDE};
pub use config::{BuildConfig, CapacityPolicy};
pub use error::{Error, Result};
pub use flags::NodeType;
pub use node_array::{FlatNodeArray, NodeArray, SIZEOF_NODE};
pub use serialization::TreeSnapshot;
pub use sorted_list::SortedList;
pub use string_pool::StringPool;
pub use tile::{
    checked_tile_to_index, index_to_tile, tile_to_index, tiles_at_level, TileCoords, MAX_LEVEL,
};
