// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transfer formats for a flattened instance tree.
//!
//! Two encodings of the same buffers:
//!
//! - JSON via [`TreeSnapshot`], for debugging and tooling.
//! - A flat little-endian blob for handing a tree to another worker or
//!   caching it on disk. Every array is written as-is, so encoding and
//!   decoding are linear copies with no per-node allocation:
//!
//! ```text
//! "LMVT" | version u32 | root_id i32
//! | node_ints u32 | children u32 | strings u32 | box_floats u32
//! | nodes i32* | children i32* | names u32* | name_suffixes i32*
//! | (len u32, utf8 bytes)* | node_boxes f32*
//! ```
//!
//! The dbId → index map is never stored; it is rebuilt from record slot 0.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::access::InstanceTreeAccess;
use crate::error::{Error, Result};
use crate::node_array::{FlatNodeArray, SIZEOF_NODE};

const MAGIC: &[u8; 4] = b"LMVT";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 * 6;

/// Serializable representation of an instance tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub root_id: i32,
    pub nodes: Vec<i32>,
    pub children: Vec<i32>,
    pub names: Vec<u32>,
    pub name_suffixes: Vec<i32>,
    pub strings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_boxes: Vec<f32>,
}

impl InstanceTreeAccess {
    /// Copies the buffers into a serializable snapshot.
    pub fn to_snapshot(&self) -> TreeSnapshot {
        let flat = self.flat();
        TreeSnapshot {
            root_id: self.root_id(),
            nodes: flat.nodes().to_vec(),
            children: flat.children().to_vec(),
            names: flat.names().to_vec(),
            name_suffixes: flat.name_suffixes().to_vec(),
            strings: flat.strings().to_vec(),
            node_boxes: self.node_boxes().to_vec(),
        }
    }

    /// Rebuilds a tree from a snapshot, validating its layout.
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Result<Self> {
        let flat = FlatNodeArray::from_parts(
            snapshot.nodes,
            snapshot.children,
            snapshot.names,
            snapshot.name_suffixes,
            snapshot.strings,
        )?;
        let boxes = (!snapshot.node_boxes.is_empty()).then_some(snapshot.node_boxes);
        InstanceTreeAccess::new(flat, snapshot.root_id, boxes)
    }

    /// Serializes the tree to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_snapshot()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a tree from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: TreeSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Encodes the tree as a binary blob.
    pub fn to_bytes(&self) -> Bytes {
        let flat = self.flat();
        let string_bytes: usize = flat.strings().iter().map(|s| 4 + s.len()).sum();
        let capacity = HEADER_LEN
            + 4 * (flat.nodes().len()
                + flat.children().len()
                + 2 * flat.num_nodes()
                + self.node_boxes().len())
            + string_bytes;

        let mut buf = BytesMut::with_capacity(capacity);
        buf.put_slice(MAGIC);
        buf.put_u32_le(FORMAT_VERSION);
        buf.put_i32_le(self.root_id());
        buf.put_u32_le(flat.nodes().len() as u32);
        buf.put_u32_le(flat.children().len() as u32);
        buf.put_u32_le(flat.strings().len() as u32);
        buf.put_u32_le(self.node_boxes().len() as u32);

        flat.nodes().iter().for_each(|&v| buf.put_i32_le(v));
        flat.children().iter().for_each(|&v| buf.put_i32_le(v));
        flat.names().iter().for_each(|&v| buf.put_u32_le(v));
        flat.name_suffixes().iter().for_each(|&v| buf.put_i32_le(v));
        for s in flat.strings() {
            buf.put_u32_le(s.len() as u32);
            buf.put_slice(s.as_bytes());
        }
        self.node_boxes().iter().for_each(|&v| buf.put_f32_le(v));

        buf.freeze()
    }

    /// Decodes a blob written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(mut data: &[u8]) -> Result<Self> {
        ensure(&data, HEADER_LEN, "header")?;
        if &data[..4] != MAGIC {
            return Err(Error::Serialization("missing LMVT magic".into()));
        }
        data.advance(4);

        let version = data.get_u32_le();
        if version != FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported format version {version}"
            )));
        }
        let root_id = data.get_i32_le();
        let node_ints = data.get_u32_le() as usize;
        let child_count = data.get_u32_le() as usize;
        let string_count = data.get_u32_le() as usize;
        let box_floats = data.get_u32_le() as usize;

        if node_ints % SIZEOF_NODE != 0 {
            return Err(Error::InvalidLayout(format!(
                "node buffer length {node_ints} is not a multiple of {SIZEOF_NODE}"
            )));
        }
        let num_nodes = node_ints / SIZEOF_NODE;

        let nodes = read_array(&mut data, node_ints, "nodes", |d| d.get_i32_le())?;
        let children = read_array(&mut data, child_count, "children", |d| d.get_i32_le())?;
        let names = read_array(&mut data, num_nodes, "names", |d| d.get_u32_le())?;
        let name_suffixes = read_array(&mut data, num_nodes, "name suffixes", |d| d.get_i32_le())?;

        let mut strings = Vec::with_capacity(string_count.min(data.remaining() / 4));
        for _ in 0..string_count {
            ensure(&data, 4, "string length")?;
            let len = data.get_u32_le() as usize;
            ensure(&data, len, "string bytes")?;
            let s = std::str::from_utf8(&data[..len])
                .map_err(|e| Error::Serialization(format!("string table: {e}")))?;
            strings.push(s.to_owned());
            data.advance(len);
        }

        let node_boxes = read_array(&mut data, box_floats, "node boxes", |d| d.get_f32_le())?;
        if data.has_remaining() {
            return Err(Error::Serialization(format!(
                "{} trailing bytes",
                data.remaining()
            )));
        }

        let flat = FlatNodeArray::from_parts(nodes, children, names, name_suffixes, strings)?;
        let boxes = (!node_boxes.is_empty()).then_some(node_boxes);
        InstanceTreeAccess::new(flat, root_id, boxes)
    }
}

fn ensure(data: &&[u8], needed: usize, what: &str) -> Result<()> {
    if data.remaining() < needed {
        return Err(Error::Serialization(format!(
            "truncated {what}: need {needed} bytes, {} left",
            data.remaining()
        )));
    }
    Ok(())
}

fn read_array<'d, T>(
    data: &mut &'d [u8],
    count: usize,
    what: &str,
    read: impl Fn(&mut &'d [u8]) -> T,
) -> Result<Vec<T>> {
    let needed = count
        .checked_mul(4)
        .ok_or_else(|| Error::Serialization(format!("{what} count overflows")))?;
    ensure(data, needed, what)?;
    Ok((0..count).map(|_| read(data)).collect())
}
