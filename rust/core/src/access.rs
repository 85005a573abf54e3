// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-mostly query layer over a flattened instance tree.
//!
//! All lookups are addressed by external dbId and resolve through one hash
//! lookup plus direct record reads. Querying a dbId that was never registered
//! is a precondition violation and panics; use [`InstanceTreeAccess::try_index`]
//! or [`InstanceTreeAccess::contains`] when the id comes from untrusted input.
//!
//! Node flags are the only mutable state. The type is `Sync`, so shared
//! readers are fine; flag writes need `&mut` and therefore external
//! synchronization.

use std::borrow::Cow;
use std::ops::ControlFlow;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::flags::{self, NodeType, NODE_FLAG_HIDE, NODE_FLAG_NOSELECT, NODE_FLAG_OFF};
use crate::names::compose_name;
use crate::node_array::{
    FlatNodeArray, OFFSET_DBID, OFFSET_FIRST_CHILD, OFFSET_FLAGS, OFFSET_NUM_CHILDREN,
    OFFSET_PARENT, SIZEOF_NODE,
};

/// Floats per node bounding box: min xyz, max xyz.
pub const BOX_STRIDE: usize = 6;

const EMPTY_BOX: [f32; BOX_STRIDE] = [
    f32::INFINITY,
    f32::INFINITY,
    f32::INFINITY,
    f32::NEG_INFINITY,
    f32::NEG_INFINITY,
    f32::NEG_INFINITY,
];

/// What a node holds, decoded from the signed child count.
#[derive(Debug, Clone)]
pub enum NodeContents<'a> {
    /// No children and no fragments.
    Empty,
    /// Internal node.
    Children(Children<'a>),
    /// Leaf node with geometry fragment ids.
    Fragments(&'a [i32]),
}

/// Iterator over the child dbIds of an internal node, in insertion order.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    nodes: &'a [i32],
    indices: std::slice::Iter<'a, i32>,
}

impl Iterator for Children<'_> {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<i32> {
        self.indices
            .next()
            .map(|&index| self.nodes[index as usize * SIZEOF_NODE + OFFSET_DBID])
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Query access to a flattened instance tree.
///
/// # Example
///
/// ```
/// use lmv_core::{InstanceTreeAccess, NodeArray};
///
/// let mut builder = NodeArray::new(3, 3);
/// builder.set_node(1, 0, "Model", 0, &[2, 3], false).unwrap();
/// builder.set_node(2, 1, "Crank Shaft:7", 0, &[100, 101], true).unwrap();
/// builder.set_node(3, 1, "Door", 0, &[102], true).unwrap();
///
/// let tree = InstanceTreeAccess::new(builder.flatten(), 1, None).unwrap();
/// assert_eq!(tree.get_num_children(1), 2);
/// assert_eq!(tree.name(2), "Crank Shaft:7");
/// assert_eq!(tree.fragments(2), &[100, 101]);
/// ```
#[derive(Debug)]
pub struct InstanceTreeAccess {
    flat: FlatNodeArray,
    root_id: i32,
    node_boxes: Vec<f32>,
    visible_ids: OnceLock<Box<[i32]>>,
}

impl InstanceTreeAccess {
    /// Wraps flattened buffers.
    ///
    /// `node_boxes`, when supplied, must hold [`BOX_STRIDE`] floats per node
    /// (sentinel included). Otherwise the buffer is allocated, zeroed, on the
    /// first box write.
    pub fn new(flat: FlatNodeArray, root_id: i32, node_boxes: Option<Vec<f32>>) -> Result<Self> {
        if !flat.db_id_to_index.contains_key(&root_id) {
            return Err(Error::UnknownDbId(root_id));
        }

        let expected = flat.num_nodes() * BOX_STRIDE;
        let node_boxes = match node_boxes {
            Some(boxes) if boxes.len() != expected => {
                return Err(Error::InvalidLayout(format!(
                    "node box buffer holds {} floats, expected {}",
                    boxes.len(),
                    expected
                )));
            }
            Some(boxes) => boxes,
            None => Vec::new(),
        };

        Ok(Self {
            flat,
            root_id,
            node_boxes,
            visible_ids: OnceLock::new(),
        })
    }

    #[inline]
    pub fn root_id(&self) -> i32 {
        self.root_id
    }

    /// Number of node records, sentinel included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.flat.num_nodes()
    }

    /// The underlying buffers, with current flag values.
    #[inline]
    pub fn flat(&self) -> &FlatNodeArray {
        &self.flat
    }

    /// Dense index of `db_id`.
    ///
    /// # Panics
    ///
    /// If `db_id` was never registered.
    #[inline]
    pub fn get_index(&self, db_id: i32) -> usize {
        self.flat.db_id_to_index[&db_id] as usize
    }

    /// Checked variant of [`get_index`](Self::get_index).
    pub fn try_index(&self, db_id: i32) -> Result<usize> {
        self.flat
            .db_id_to_index
            .get(&db_id)
            .map(|&index| index as usize)
            .ok_or(Error::UnknownDbId(db_id))
    }

    #[inline]
    pub fn contains(&self, db_id: i32) -> bool {
        self.flat.db_id_to_index.contains_key(&db_id)
    }

    #[inline]
    fn record(&self, db_id: i32) -> &[i32] {
        let base = self.get_index(db_id) * SIZEOF_NODE;
        &self.flat.nodes[base..base + SIZEOF_NODE]
    }

    #[inline]
    fn child_slots(&self, record: &[i32]) -> &[i32] {
        let first = record[OFFSET_FIRST_CHILD] as usize;
        let count = record[OFFSET_NUM_CHILDREN].unsigned_abs() as usize;
        &self.flat.children[first..first + count]
    }

    /// Reconstructed display name.
    pub fn name(&self, db_id: i32) -> Cow<'_, str> {
        let index = self.get_index(db_id);
        let base = &self.flat.strings[self.flat.names[index] as usize];
        compose_name(base, self.flat.name_suffixes[index])
    }

    #[inline]
    pub fn get_parent_id(&self, db_id: i32) -> i32 {
        self.record(db_id)[OFFSET_PARENT]
    }

    #[inline]
    pub fn get_node_flags(&self, db_id: i32) -> u32 {
        self.record(db_id)[OFFSET_FLAGS] as u32
    }

    #[inline]
    pub fn set_node_flags(&mut self, db_id: i32, flags: u32) {
        let base = self.get_index(db_id) * SIZEOF_NODE;
        self.flat.nodes[base + OFFSET_FLAGS] = flags as i32;
    }

    /// Number of child nodes; 0 for leaves.
    #[inline]
    pub fn get_num_children(&self, db_id: i32) -> usize {
        let count = self.record(db_id)[OFFSET_NUM_CHILDREN];
        if count > 0 {
            count as usize
        } else {
            0
        }
    }

    /// Number of fragments; 0 for internal nodes.
    #[inline]
    pub fn get_num_fragments(&self, db_id: i32) -> usize {
        let count = self.record(db_id)[OFFSET_NUM_CHILDREN];
        if count < 0 {
            count.unsigned_abs() as usize
        } else {
            0
        }
    }

    /// Decodes the node into children, fragments or nothing.
    pub fn node_contents(&self, db_id: i32) -> NodeContents<'_> {
        let record = self.record(db_id);
        let count = record[OFFSET_NUM_CHILDREN];
        let slots = self.child_slots(record);
        match count {
            0 => NodeContents::Empty,
            c if c > 0 => NodeContents::Children(Children {
                nodes: &self.flat.nodes,
                indices: slots.iter(),
            }),
            _ => NodeContents::Fragments(slots),
        }
    }

    /// Child dbIds of an internal node; empty for leaves.
    pub fn children(&self, db_id: i32) -> Children<'_> {
        let record = self.record(db_id);
        let slots = if record[OFFSET_NUM_CHILDREN] > 0 {
            self.child_slots(record)
        } else {
            &[]
        };
        Children {
            nodes: &self.flat.nodes,
            indices: slots.iter(),
        }
    }

    /// Fragment ids of a leaf; empty for internal nodes.
    pub fn fragments(&self, db_id: i32) -> &[i32] {
        let record = self.record(db_id);
        if record[OFFSET_NUM_CHILDREN] < 0 {
            self.child_slots(record)
        } else {
            &[]
        }
    }

    /// Calls `callback(child_db_id, db_id, index)` for each child in insertion order.
    ///
    /// Returns `Some(db_id)` if the callback broke out early.
    pub fn enum_node_children<F>(&self, db_id: i32, mut callback: F) -> Option<i32>
    where
        F: FnMut(i32, i32, usize) -> ControlFlow<()>,
    {
        let index = self.get_index(db_id);
        for child in self.children(db_id) {
            if callback(child, db_id, index).is_break() {
                return Some(db_id);
            }
        }
        None
    }

    /// Calls `callback(fragment_id, db_id, index)` for each fragment of a leaf.
    ///
    /// Returns `Some(db_id)` if the callback broke out early.
    pub fn enum_node_fragments<F>(&self, db_id: i32, mut callback: F) -> Option<i32>
    where
        F: FnMut(i32, i32, usize) -> ControlFlow<()>,
    {
        let index = self.get_index(db_id);
        for &fragment in self.fragments(db_id) {
            if callback(fragment, db_id, index).is_break() {
                return Some(db_id);
            }
        }
        None
    }

    /// Pre-order depth-first walk of the subtree under `db_id`.
    ///
    /// The visitor receives each dbId and its depth relative to `db_id`.
    /// Each node is visited at most once, so shared or cyclic child
    /// references terminate. Returns the dbId at which the visitor broke
    /// out, if any.
    pub fn walk<F>(&self, db_id: i32, mut visitor: F) -> Option<i32>
    where
        F: FnMut(i32, usize) -> ControlFlow<()>,
    {
        let mut visited = vec![false; self.num_nodes()];
        let mut stack = vec![(db_id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            let index = self.get_index(current);
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            if visitor(current, depth).is_break() {
                return Some(current);
            }
            let before = stack.len();
            stack.extend(self.children(current).map(|child| (child, depth + 1)));
            stack[before..].reverse();
        }
        None
    }

    /// Copies the node's bounding box into `dst[..6]`.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than [`BOX_STRIDE`].
    ///
    /// Reads zeros while no box has been written.
    #[inline]
    pub fn get_node_box(&self, db_id: i32, dst: &mut [f32]) {
        let base = self.get_index(db_id) * BOX_STRIDE;
        match self.node_boxes.get(base..base + BOX_STRIDE) {
            Some(bounds) => dst[..BOX_STRIDE].copy_from_slice(bounds),
            None => dst[..BOX_STRIDE].fill(0.0),
        }
    }

    #[inline]
    pub fn set_node_box(&mut self, db_id: i32, bounds: &[f32; BOX_STRIDE]) {
        let base = self.get_index(db_id) * BOX_STRIDE;
        self.boxes_mut()[base..base + BOX_STRIDE].copy_from_slice(bounds);
    }

    /// The whole node box buffer, indexed by dense node index.
    ///
    /// Empty until a box is first written.
    #[inline]
    pub fn node_boxes(&self) -> &[f32] {
        &self.node_boxes
    }

    fn boxes_mut(&mut self) -> &mut Vec<f32> {
        if self.node_boxes.is_empty() {
            self.node_boxes = vec![0.0; self.num_nodes() * BOX_STRIDE];
        }
        &mut self.node_boxes
    }

    /// Fills node boxes bottom-up from fragment bounds.
    ///
    /// Leaves get the union of their fragments' boxes, internal nodes the
    /// union of their children. Fragments for which `fragment_box` returns
    /// `None` are skipped. Only nodes reachable from the root are touched;
    /// a node with no bounded geometry ends up with an inverted (empty) box.
    pub fn compute_node_boxes<F>(&mut self, mut fragment_box: F)
    where
        F: FnMut(i32) -> Option<[f32; BOX_STRIDE]>,
    {
        let mut order = Vec::with_capacity(self.num_nodes());
        self.walk(self.root_id, |db_id, _| {
            order.push(db_id);
            ControlFlow::Continue(())
        });

        let mut boxes = std::mem::take(self.boxes_mut());
        for &db_id in order.iter().rev() {
            let mut bounds = EMPTY_BOX;
            match self.node_contents(db_id) {
                NodeContents::Empty => {}
                NodeContents::Fragments(fragments) => {
                    for bb in fragments.iter().filter_map(|&f| fragment_box(f)) {
                        union_box(&mut bounds, &bb);
                    }
                }
                NodeContents::Children(children) => {
                    for child in children {
                        let base = self.get_index(child) * BOX_STRIDE;
                        union_box(&mut bounds, &boxes[base..base + BOX_STRIDE]);
                    }
                }
            }
            let base = self.get_index(db_id) * BOX_STRIDE;
            boxes[base..base + BOX_STRIDE].copy_from_slice(&bounds);
        }
        self.node_boxes = boxes;
    }

    /// All registered dbIds except the sentinel, in unspecified order.
    ///
    /// Computed on first call and cached.
    pub fn get_visible_ids(&self) -> &[i32] {
        self.visible_ids.get_or_init(|| {
            self.flat
                .db_id_to_index
                .keys()
                .copied()
                .filter(|&db_id| db_id != 0)
                .collect()
        })
    }

    // --- Flag helpers ---

    pub fn node_type(&self, db_id: i32) -> Option<NodeType> {
        NodeType::from_flags(self.get_node_flags(db_id))
    }

    pub fn is_node_hidden(&self, db_id: i32) -> bool {
        self.get_node_flags(db_id) & NODE_FLAG_HIDE != 0
    }

    pub fn is_node_off(&self, db_id: i32) -> bool {
        self.get_node_flags(db_id) & NODE_FLAG_OFF != 0
    }

    pub fn is_node_selectable(&self, db_id: i32) -> bool {
        self.get_node_flags(db_id) & NODE_FLAG_NOSELECT == 0
    }

    pub fn set_node_hidden(&mut self, db_id: i32, hidden: bool) {
        let current = self.get_node_flags(db_id);
        self.set_node_flags(db_id, flags::with_bit(current, NODE_FLAG_HIDE, hidden));
    }

    pub fn set_node_off(&mut self, db_id: i32, off: bool) {
        let current = self.get_node_flags(db_id);
        self.set_node_flags(db_id, flags::with_bit(current, NODE_FLAG_OFF, off));
    }
}

fn union_box(dst: &mut [f32; BOX_STRIDE], src: &[f32]) {
    for axis in 0..3 {
        dst[axis] = dst[axis].min(src[axis]);
        dst[axis + 3] = dst[axis + 3].max(src[axis + 3]);
    }
}
