// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::ops::ControlFlow;

use lmv_core::{
    index_to_tile, tile_to_index, BuildConfig, CapacityPolicy, Error, InstanceTreeAccess,
    NodeArray, SortedList, TileCoords,
};

/// Root 1 with two leaves, as a loader would register it.
fn small_model() -> InstanceTreeAccess {
    let mut builder = NodeArray::new(3, 3);
    builder.set_node(1, 0, "Model", 0, &[2, 3], false).unwrap();
    builder.set_node(2, 1, "Base Wall [12345]", 0, &[100, 101], true).unwrap();
    builder.set_node(3, 1, "Crank Shaft:7", 0, &[102], true).unwrap();
    InstanceTreeAccess::new(builder.flatten(), 1, None).unwrap()
}

/// Sparse dbIds, children registered before their parents.
fn building_model() -> InstanceTreeAccess {
    let mut builder = NodeArray::new(8, 12);
    builder.set_node(5001, 300, "Door [5001]", 6, &[40, 41], true).unwrap();
    builder.set_node(5002, 300, "Door [5002]", 6, &[42], true).unwrap();
    builder.set_node(7000, 300, "Window:3", 6, &[], true).unwrap();
    builder.set_node(300, 20, "Level 1", 2, &[5001, 5002, 7000], false).unwrap();
    builder.set_node(301, 20, "Level 2", 2, &[9000], false).unwrap();
    builder.set_node(9000, 301, "Weird]Name[", 6, &[43, 44, 45], true).unwrap();
    builder.set_node(20, 0, "Building", 5, &[300, 301], false).unwrap();
    InstanceTreeAccess::new(builder.flatten(), 20, None).unwrap()
}

#[test]
fn end_to_end_scenario() {
    let tree = small_model();
    assert_eq!(tree.get_num_children(1), 2);
    assert_eq!(tree.get_num_fragments(2), 2);
    assert_eq!(tree.get_parent_id(2), 1);

    let mut fragments = Vec::new();
    tree.enum_node_fragments(2, |fragment, _, _| {
        fragments.push(fragment);
        ControlFlow::Continue(())
    });
    assert_eq!(fragments, vec![100, 101]);

    let visible: HashSet<i32> = tree.get_visible_ids().iter().copied().collect();
    assert_eq!(visible, HashSet::from([1, 2, 3]));
}

#[test]
fn leaf_and_internal_are_exclusive() {
    let tree = building_model();
    for &db_id in tree.get_visible_ids() {
        assert!(
            !(tree.get_num_children(db_id) > 0 && tree.get_num_fragments(db_id) > 0),
            "dbId {db_id} reports both children and fragments"
        );
    }
}

#[test]
fn enumeration_matches_counts_in_insertion_order() {
    let tree = building_model();
    for &db_id in tree.get_visible_ids() {
        let mut children = Vec::new();
        tree.enum_node_children(db_id, |child, parent, _| {
            assert_eq!(parent, db_id);
            children.push(child);
            ControlFlow::Continue(())
        });
        assert_eq!(children.len(), tree.get_num_children(db_id));

        let mut fragments = 0;
        tree.enum_node_fragments(db_id, |_, _, _| {
            fragments += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(fragments, tree.get_num_fragments(db_id));
    }

    assert_eq!(tree.children(300).collect::<Vec<_>>(), vec![5001, 5002, 7000]);
    assert_eq!(tree.fragments(9000), &[43, 44, 45]);
}

#[test]
fn children_registered_late_keep_their_index() {
    let tree = building_model();
    assert_eq!(tree.get_parent_id(5001), 300);
    assert_eq!(tree.get_parent_id(300), 20);
    assert_eq!(tree.get_num_fragments(7000), 0);
    assert_eq!(tree.get_num_children(7000), 0);

    let indices: HashSet<usize> = tree.get_visible_ids().iter().map(|&id| tree.get_index(id)).collect();
    assert_eq!(indices.len(), tree.get_visible_ids().len());
    assert!(!indices.contains(&0));
    assert_eq!(tree.get_index(0), 0);
}

#[test]
fn names_round_trip_through_the_pool() {
    let tree = small_model();
    assert_eq!(tree.name(2), "Base Wall [12345]");
    assert_eq!(tree.name(3), "Crank Shaft:7");
    assert_eq!(tree.name(1), "Model");

    let tree = building_model();
    assert_eq!(tree.name(5001), "Door [5001]");
    assert_eq!(tree.name(5002), "Door [5002]");
    assert_eq!(tree.name(9000), "Weird]Name[");
    assert_eq!(tree.name(7000), "Window:3");

    let pooled = tree.flat().strings().iter().filter(|s| s.as_str() == "Door [").count();
    assert_eq!(pooled, 1);
}

#[test]
fn walk_visits_the_whole_building() {
    let tree = building_model();
    let mut order = Vec::new();
    tree.walk(tree.root_id(), |db_id, _| {
        order.push(db_id);
        ControlFlow::Continue(())
    });
    assert_eq!(order, vec![20, 300, 5001, 5002, 7000, 301, 9000]);

    let stopped = tree.walk(tree.root_id(), |_, depth| {
        if depth == 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(stopped, Some(5001));
}

#[test]
fn hiding_does_not_change_topology() {
    let mut tree = building_model();
    tree.set_node_hidden(300, true);
    assert!(tree.is_node_hidden(300));
    assert_eq!(tree.get_node_flags(300) & 0x7, 2);
    assert_eq!(tree.get_num_children(300), 3);
    assert_eq!(tree.children(300).count(), 3);
}

#[test]
fn undersized_hints_fail_loudly_by_default() {
    let mut builder = NodeArray::new(1, 0);
    let err = builder.set_node(1, 0, "Root", 0, &[2, 3], false).unwrap_err();
    assert!(matches!(err, Error::ChildCapacityExceeded { .. }));

    let mut builder = NodeArray::with_config(BuildConfig {
        capacity_policy: CapacityPolicy::Grow,
        ..BuildConfig::new(1, 0)
    });
    builder.set_node(1, 0, "Root", 0, &[2, 3], false).unwrap();
    builder.set_node(2, 1, "A", 0, &[10], true).unwrap();
    builder.set_node(3, 1, "B", 0, &[11], true).unwrap();
    let tree = InstanceTreeAccess::new(builder.flatten(), 1, None).unwrap();
    assert_eq!(tree.fragments(3), &[11]);
}

#[test]
fn worker_hand_off_via_blob() {
    let mut tree = building_model();
    tree.set_node_off(301, true);
    let blob = tree.to_bytes();

    let copy = InstanceTreeAccess::from_bytes(&blob).unwrap();
    assert_eq!(copy.root_id(), 20);
    assert!(copy.is_node_off(301));
    assert_eq!(copy.children(20).collect::<Vec<_>>(), vec![300, 301]);
    assert_eq!(copy.name(5002), "Door [5002]");

    let mut ids = copy.get_visible_ids().to_vec();
    ids.sort_unstable();
    assert_eq!(ids, vec![20, 300, 301, 5001, 5002, 7000, 9000]);
}

#[test]
fn tile_index_round_trip() {
    for i in 0..340u64 {
        assert_eq!(tile_to_index(&index_to_tile(i)), i);
    }
    assert_eq!(tile_to_index(&TileCoords::new(2, 3, 1)), 12);
    assert_eq!(index_to_tile(12), TileCoords::new(2, 3, 1));
}

#[test]
fn sorted_list_tracks_an_ordered_stream() {
    let mut list = SortedList::new();
    let mut seed: u32 = 12345;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        list.add((seed >> 16) % 1000);
        for i in 1..list.len() {
            assert!(list.get(i - 1) <= list.get(i));
        }
    }

    let before = list.size();
    let removed = list.remove_at(17);
    assert!(removed.is_some());
    assert_eq!(list.size(), before - 1);
    assert_eq!(list.iter().count(), before - 1);
    for rank in 0..list.size() {
        assert!(list.get(rank).is_some());
    }
}
