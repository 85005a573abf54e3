// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![cfg(target_arch = "wasm32")]

use lmv_wasm::{InstanceTree, InstanceTreeBuilder, TileIndex};
use wasm_bindgen_test::*;

fn build() -> InstanceTree {
    let mut builder = InstanceTreeBuilder::new(3, 3, None);
    builder.set_node(1, 0, Some("Model".into()), 0, &[2, 3], false).unwrap();
    builder
        .set_node(2, 1, Some("Base Wall [12345]".into()), 0, &[100, 101], true)
        .unwrap();
    builder.set_node(3, 1, None, 0, &[102], true).unwrap();
    builder.flatten(1, None).unwrap()
}

#[wasm_bindgen_test]
fn builder_to_tree() {
    let tree = build();
    assert_eq!(tree.get_num_children(1).unwrap(), 2);
    assert_eq!(tree.get_fragments(2).unwrap(), vec![100, 101]);
    assert_eq!(tree.name(2).unwrap(), "Base Wall [12345]");
    assert_eq!(tree.name(3).unwrap(), "");
    assert!(tree.name(42).is_err());
}

#[wasm_bindgen_test]
fn blob_transfer() {
    let mut tree = build();
    tree.set_node_hidden(2, true).unwrap();
    let copy = InstanceTree::from_bytes(&tree.to_bytes()).unwrap();
    assert!(copy.is_node_hidden(2).unwrap());
    assert_eq!(copy.get_children(1).unwrap(), vec![2, 3]);
}

#[wasm_bindgen_test]
fn tile_round_trip() {
    let tile = TileIndex::from_index(12);
    assert_eq!((tile.level, tile.x, tile.y), (2, 3, 1));
    assert_eq!(tile.to_index().unwrap(), 12);
}
