// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance tree builder and its flattened storage.
//!
//! ## Layout
//!
//! Each node gets a dense index (0 is the reserved sentinel) and a fixed
//! record of [`SIZEOF_NODE`] integers in one flat buffer:
//!
//! ```text
//! [dbId, parentDbId, firstChild, numChildren, flags]
//! ```
//!
//! `numChildren` is signed: a positive count means `children[firstChild..]`
//! holds dense child *indices*, a negative count means it holds raw fragment
//! ids (leaf). Names are stored as a pool id plus an integer suffix, see
//! [`crate::names`].

use rustc_hash::FxHashMap;

use crate::config::{BuildConfig, CapacityPolicy};
use crate::error::{Error, Result};
use crate::names::split_name;
use crate::string_pool::StringPool;

/// Number of integers per node record.
pub const SIZEOF_NODE: usize = 5;

pub(crate) const OFFSET_DBID: usize = 0;
pub(crate) const OFFSET_PARENT: usize = 1;
pub(crate) const OFFSET_FIRST_CHILD: usize = 2;
pub(crate) const OFFSET_NUM_CHILDREN: usize = 3;
pub(crate) const OFFSET_FLAGS: usize = 4;

/// Growable builder for an instance tree.
///
/// A hierarchy loader calls [`set_node`](Self::set_node) once per node, in
/// any order, then [`flatten`](Self::flatten) once.
///
/// # Example
///
/// ```
/// use lmv_core::NodeArray;
///
/// let mut builder = NodeArray::new(3, 3);
/// builder.set_node(1, 0, "Model", 0, &[2, 3], false).unwrap();
/// builder.set_node(2, 1, "Base Wall [12]", 0, &[100, 101], true).unwrap();
/// builder.set_node(3, 1, "Door", 0, &[102], true).unwrap();
///
/// let flat = builder.flatten();
/// assert_eq!(flat.num_nodes(), 4);
/// ```
#[derive(Debug)]
pub struct NodeArray {
    nodes: Vec<i32>,
    children: Vec<i32>,
    child_capacity: usize,
    policy: CapacityPolicy,
    grown: bool,
    db_id_to_index: FxHashMap<i32, u32>,
    names: Vec<u32>,
    name_suffixes: Vec<i32>,
    pool: StringPool,
}

impl NodeArray {
    /// Creates a builder sized for `object_count` nodes and `fragment_count` fragments.
    pub fn new(object_count: usize, fragment_count: usize) -> Self {
        Self::with_config(BuildConfig::new(object_count, fragment_count))
    }

    pub fn with_config(config: BuildConfig) -> Self {
        let node_hint = config.object_count + 1;
        let mut array = Self {
            nodes: Vec::with_capacity(node_hint * SIZEOF_NODE),
            children: Vec::with_capacity(config.child_capacity()),
            child_capacity: config.child_capacity(),
            policy: config.capacity_policy,
            grown: false,
            db_id_to_index: FxHashMap::default(),
            names: Vec::with_capacity(node_hint),
            name_suffixes: Vec::with_capacity(node_hint),
            pool: StringPool::new(),
        };
        // Sentinel: dbId 0 occupies index 0.
        array.get_index(0);
        array
    }

    /// Returns the dense index of `db_id`, allocating a blank record on first use.
    pub fn get_index(&mut self, db_id: i32) -> u32 {
        if let Some(&index) = self.db_id_to_index.get(&db_id) {
            return index;
        }

        let index = self.num_nodes() as u32;
        self.nodes.extend_from_slice(&[db_id, 0, 0, 0, 0]);
        self.names.push(0);
        self.name_suffixes.push(0);
        self.db_id_to_index.insert(db_id, index);
        index
    }

    /// Registers a node and its children (or fragments, when `is_leaf`).
    ///
    /// Child dbIds get an index immediately, even if their own `set_node`
    /// call comes later. Under [`CapacityPolicy::Strict`] a call that would
    /// overflow the children buffer fails without modifying the builder.
    ///
    /// Returns the node's dense index.
    pub fn set_node(
        &mut self,
        db_id: i32,
        parent_db_id: i32,
        name: &str,
        flags: u32,
        children_ids: &[i32],
        is_leaf: bool,
    ) -> Result<u32> {
        self.reserve_children(db_id, children_ids.len())?;

        let index = self.get_index(db_id);
        let base = index as usize * SIZEOF_NODE;
        let count = children_ids.len() as i32;

        self.nodes[base + OFFSET_PARENT] = parent_db_id;
        self.nodes[base + OFFSET_FIRST_CHILD] = self.children.len() as i32;
        self.nodes[base + OFFSET_NUM_CHILDREN] = if is_leaf { -count } else { count };
        self.nodes[base + OFFSET_FLAGS] = flags as i32;

        if is_leaf {
            self.children.extend_from_slice(children_ids);
        } else {
            for &child_id in children_ids {
                let child_index = self.get_index(child_id);
                self.children.push(child_index as i32);
            }
        }

        self.process_name(index, name);
        Ok(index)
    }

    fn reserve_children(&mut self, db_id: i32, count: usize) -> Result<()> {
        let required = self.children.len() + count;
        if required <= self.child_capacity {
            return Ok(());
        }

        match self.policy {
            CapacityPolicy::Strict => {
                tracing::error!(
                    db_id,
                    required,
                    capacity = self.child_capacity,
                    "children buffer overflow, object/fragment count hints are too small"
                );
                Err(Error::ChildCapacityExceeded {
                    required,
                    capacity: self.child_capacity,
                })
            }
            CapacityPolicy::Grow => {
                if !self.grown {
                    tracing::warn!(
                        db_id,
                        required,
                        capacity = self.child_capacity,
                        "children buffer grown past its size hint"
                    );
                    self.grown = true;
                }
                self.child_capacity = required;
                Ok(())
            }
        }
    }

    fn process_name(&mut self, index: u32, name: &str) {
        let (base, suffix) = split_name(name);
        if suffix == 0 && (name.contains('[') || name.contains(':')) {
            tracing::trace!(index, name, "name stored uncompressed");
        }
        let id = self.pool.intern(base);
        self.names[index as usize] = id;
        self.name_suffixes[index as usize] = suffix;
    }

    /// Number of allocated nodes, sentinel included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() / SIZEOF_NODE
    }

    /// Number of children-buffer slots written so far.
    #[inline]
    pub fn num_children_written(&self) -> usize {
        self.children.len()
    }

    /// Freezes the builder into fixed buffers, dropping the string lookup map.
    pub fn flatten(self) -> FlatNodeArray {
        let strings = self.pool.into_strings();
        tracing::debug!(
            nodes = self.nodes.len() / SIZEOF_NODE,
            children = self.children.len(),
            strings = strings.len(),
            "flattened instance tree"
        );

        FlatNodeArray {
            nodes: self.nodes.into_boxed_slice(),
            children: self.children.into_boxed_slice(),
            names: self.names.into_boxed_slice(),
            name_suffixes: self.name_suffixes.into_boxed_slice(),
            strings,
            db_id_to_index: self.db_id_to_index,
        }
    }
}

/// Fixed-size buffers produced by [`NodeArray::flatten`].
///
/// This is the transferable form of the tree: four integer arrays, a string
/// table, and the dbId → index map (rebuilt from record slot 0 on import).
#[derive(Debug, Clone)]
pub struct FlatNodeArray {
    pub(crate) nodes: Box<[i32]>,
    pub(crate) children: Box<[i32]>,
    pub(crate) names: Box<[u32]>,
    pub(crate) name_suffixes: Box<[i32]>,
    pub(crate) strings: Box<[String]>,
    pub(crate) db_id_to_index: FxHashMap<i32, u32>,
}

impl FlatNodeArray {
    /// Reassembles flattened buffers, validating that they describe a
    /// consistent tree.
    pub fn from_parts(
        nodes: Vec<i32>,
        children: Vec<i32>,
        names: Vec<u32>,
        name_suffixes: Vec<i32>,
        strings: Vec<String>,
    ) -> Result<Self> {
        if nodes.is_empty() || nodes.len() % SIZEOF_NODE != 0 {
            return Err(Error::InvalidLayout(format!(
                "node buffer length {} is not a positive multiple of {}",
                nodes.len(),
                SIZEOF_NODE
            )));
        }
        let num_nodes = nodes.len() / SIZEOF_NODE;

        if names.len() != num_nodes || name_suffixes.len() != num_nodes {
            return Err(Error::InvalidLayout(format!(
                "{} nodes but {} names and {} name suffixes",
                num_nodes,
                names.len(),
                name_suffixes.len()
            )));
        }
        if let Some(&bad) = names.iter().find(|&&id| id as usize >= strings.len()) {
            return Err(Error::InvalidLayout(format!(
                "name id {} outside string table of {}",
                bad,
                strings.len()
            )));
        }
        if nodes[OFFSET_DBID] != 0 {
            return Err(Error::InvalidLayout("index 0 is not the sentinel record".into()));
        }

        let mut db_id_to_index = FxHashMap::default();
        db_id_to_index.reserve(num_nodes);

        for (index, record) in nodes.chunks_exact(SIZEOF_NODE).enumerate() {
            let db_id = record[OFFSET_DBID];
            if db_id_to_index.insert(db_id, index as u32).is_some() {
                return Err(Error::InvalidLayout(format!("dbId {} appears twice", db_id)));
            }

            let first = record[OFFSET_FIRST_CHILD];
            let count = record[OFFSET_NUM_CHILDREN];
            let end = first as i64 + count.unsigned_abs() as i64;
            if first < 0 || end > children.len() as i64 {
                return Err(Error::InvalidLayout(format!(
                    "dbId {} children range {}..{} outside buffer of {}",
                    db_id,
                    first,
                    end,
                    children.len()
                )));
            }
            if count > 0 {
                let range = first as usize..end as usize;
                if let Some(&bad) = children[range]
                    .iter()
                    .find(|&&child| child <= 0 || child as usize >= num_nodes)
                {
                    return Err(Error::InvalidLayout(format!(
                        "dbId {} references child index {} of {} nodes",
                        db_id, bad, num_nodes
                    )));
                }
            }
        }

        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            children: children.into_boxed_slice(),
            names: names.into_boxed_slice(),
            name_suffixes: name_suffixes.into_boxed_slice(),
            strings: strings.into_boxed_slice(),
            db_id_to_index,
        })
    }

    /// Number of node records, sentinel included.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() / SIZEOF_NODE
    }

    #[inline]
    pub fn nodes(&self) -> &[i32] {
        &self.nodes
    }

    #[inline]
    pub fn children(&self) -> &[i32] {
        &self.children
    }

    #[inline]
    pub fn names(&self) -> &[u32] {
        &self.names
    }

    #[inline]
    pub fn name_suffixes(&self) -> &[i32] {
        &self.name_suffixes
    }

    #[inline]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}
