// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance tree builder and reader exposed to JavaScript.

use std::ops::ControlFlow;

use js_sys::Function;
use lmv_core::{BuildConfig, CapacityPolicy, InstanceTreeAccess, NodeArray, BOX_STRIDE};
use wasm_bindgen::prelude::*;

use crate::utils::to_js_error;

/// Builder fed by the property-database loader, one node at a time.
#[wasm_bindgen]
pub struct InstanceTreeBuilder {
    inner: NodeArray,
}

#[wasm_bindgen]
impl InstanceTreeBuilder {
    /// Create a builder sized for the given object and fragment counts.
    /// With `allowGrowth`, undersized hints only log instead of failing.
    #[wasm_bindgen(constructor)]
    pub fn new(
        object_count: usize,
        fragment_count: usize,
        allow_growth: Option<bool>,
    ) -> InstanceTreeBuilder {
        let capacity_policy = if allow_growth.unwrap_or(false) {
            CapacityPolicy::Grow
        } else {
            CapacityPolicy::Strict
        };
        InstanceTreeBuilder {
            inner: NodeArray::with_config(BuildConfig {
                capacity_policy,
                ..BuildConfig::new(object_count, fragment_count)
            }),
        }
    }

    /// Register a node. `children` holds child dbIds, or fragment ids when `isLeaf`.
    #[wasm_bindgen(js_name = setNode)]
    pub fn set_node(
        &mut self,
        db_id: i32,
        parent_db_id: i32,
        name: Option<String>,
        flags: u32,
        children: &[i32],
        is_leaf: bool,
    ) -> Result<u32, JsValue> {
        self.inner
            .set_node(
                db_id,
                parent_db_id,
                name.as_deref().unwrap_or(""),
                flags,
                children,
                is_leaf,
            )
            .map_err(to_js_error)
    }

    /// Dense index for a dbId, allocating one if needed
    #[wasm_bindgen(js_name = getIndex)]
    pub fn get_index(&mut self, db_id: i32) -> u32 {
        self.inner.get_index(db_id)
    }

    /// Number of allocated nodes, sentinel included
    #[wasm_bindgen(getter, js_name = numNodes)]
    pub fn num_nodes(&self) -> usize {
        self.inner.num_nodes()
    }

    /// Freeze the builder into a queryable tree. The builder is consumed.
    pub fn flatten(self, root_id: i32, node_boxes: Option<Vec<f32>>) -> Result<InstanceTree, JsValue> {
        let inner =
            InstanceTreeAccess::new(self.inner.flatten(), root_id, node_boxes).map_err(to_js_error)?;
        Ok(InstanceTree { inner })
    }
}

/// Read-mostly instance tree addressed by dbId.
///
/// Querying an unknown dbId throws.
#[wasm_bindgen]
pub struct InstanceTree {
    inner: InstanceTreeAccess,
}

impl InstanceTree {
    fn check(&self, db_id: i32) -> Result<(), JsValue> {
        self.inner.try_index(db_id).map(|_| ()).map_err(to_js_error)
    }

    /// Access the underlying tree from Rust
    pub fn access(&self) -> &InstanceTreeAccess {
        &self.inner
    }
}

#[wasm_bindgen]
impl InstanceTree {
    /// Decode a blob produced by `toBytes()`, e.g. after a worker transfer
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(data: &[u8]) -> Result<InstanceTree, JsValue> {
        let inner = InstanceTreeAccess::from_bytes(data).map_err(to_js_error)?;
        Ok(InstanceTree { inner })
    }

    /// Encode the tree (with current flags and boxes) as a Uint8Array
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    /// Plain JS object with all buffers, for debugging
    #[wasm_bindgen(js_name = toSnapshot)]
    pub fn to_snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.to_snapshot()).map_err(Into::into)
    }

    #[wasm_bindgen(getter, js_name = rootId)]
    pub fn root_id(&self) -> i32 {
        self.inner.root_id()
    }

    #[wasm_bindgen(getter, js_name = numNodes)]
    pub fn num_nodes(&self) -> usize {
        self.inner.num_nodes()
    }

    #[wasm_bindgen(js_name = getIndex)]
    pub fn get_index(&self, db_id: i32) -> Result<usize, JsValue> {
        self.inner.try_index(db_id).map_err(to_js_error)
    }

    pub fn contains(&self, db_id: i32) -> bool {
        self.inner.contains(db_id)
    }

    pub fn name(&self, db_id: i32) -> Result<String, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.name(db_id).into_owned())
    }

    #[wasm_bindgen(js_name = getParentId)]
    pub fn get_parent_id(&self, db_id: i32) -> Result<i32, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.get_parent_id(db_id))
    }

    #[wasm_bindgen(js_name = getNodeFlags)]
    pub fn get_node_flags(&self, db_id: i32) -> Result<u32, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.get_node_flags(db_id))
    }

    #[wasm_bindgen(js_name = setNodeFlags)]
    pub fn set_node_flags(&mut self, db_id: i32, flags: u32) -> Result<(), JsValue> {
        self.check(db_id)?;
        self.inner.set_node_flags(db_id, flags);
        Ok(())
    }

    #[wasm_bindgen(js_name = setNodeHidden)]
    pub fn set_node_hidden(&mut self, db_id: i32, hidden: bool) -> Result<(), JsValue> {
        self.check(db_id)?;
        self.inner.set_node_hidden(db_id, hidden);
        Ok(())
    }

    #[wasm_bindgen(js_name = isNodeHidden)]
    pub fn is_node_hidden(&self, db_id: i32) -> Result<bool, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.is_node_hidden(db_id))
    }

    #[wasm_bindgen(js_name = getNumChildren)]
    pub fn get_num_children(&self, db_id: i32) -> Result<usize, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.get_num_children(db_id))
    }

    #[wasm_bindgen(js_name = getNumFragments)]
    pub fn get_num_fragments(&self, db_id: i32) -> Result<usize, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.get_num_fragments(db_id))
    }

    /// Child dbIds as an Int32Array
    #[wasm_bindgen(js_name = getChildren)]
    pub fn get_children(&self, db_id: i32) -> Result<Vec<i32>, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.children(db_id).collect())
    }

    /// Fragment ids as an Int32Array
    #[wasm_bindgen(js_name = getFragments)]
    pub fn get_fragments(&self, db_id: i32) -> Result<Vec<i32>, JsValue> {
        self.check(db_id)?;
        Ok(self.inner.fragments(db_id).to_vec())
    }

    /// Call `callback(childDbId, dbId, index)` per child; a truthy return stops.
    /// Returns the dbId when stopped early, undefined otherwise.
    #[wasm_bindgen(js_name = enumNodeChildren)]
    pub fn enum_node_children(&self, db_id: i32, callback: &Function) -> Result<Option<i32>, JsValue> {
        self.check(db_id)?;
        let mut failure = None;
        let stopped = self.inner.enum_node_children(db_id, |child, parent, index| {
            call_visitor(callback, child, parent, index, &mut failure)
        });
        failure.map_or(Ok(stopped), Err)
    }

    /// Call `callback(fragId, dbId, index)` per fragment; a truthy return stops.
    #[wasm_bindgen(js_name = enumNodeFragments)]
    pub fn enum_node_fragments(&self, db_id: i32, callback: &Function) -> Result<Option<i32>, JsValue> {
        self.check(db_id)?;
        let mut failure = None;
        let stopped = self.inner.enum_node_fragments(db_id, |fragment, parent, index| {
            call_visitor(callback, fragment, parent, index, &mut failure)
        });
        failure.map_or(Ok(stopped), Err)
    }

    /// Copy the node's bounding box (min xyz, max xyz) into `dst`
    #[wasm_bindgen(js_name = getNodeBox)]
    pub fn get_node_box(&self, db_id: i32, dst: &mut [f32]) -> Result<(), JsValue> {
        self.check(db_id)?;
        if dst.len() < BOX_STRIDE {
            return Err(JsValue::from_str("node box destination needs 6 floats"));
        }
        self.inner.get_node_box(db_id, dst);
        Ok(())
    }

    /// Union fragment boxes into node boxes; `fragmentBoxes` holds 6 floats per fragment id
    #[wasm_bindgen(js_name = computeNodeBoxes)]
    pub fn compute_node_boxes(&mut self, fragment_boxes: &[f32]) {
        self.inner
            .compute_node_boxes(|fragment| fragment_box_at(fragment_boxes, fragment));
    }

    /// All registered dbIds as an Int32Array
    #[wasm_bindgen(js_name = getVisibleIds)]
    pub fn get_visible_ids(&self) -> Vec<i32> {
        self.inner.get_visible_ids().to_vec()
    }
}

/// Box of `fragment` in a flat 6-floats-per-fragment buffer.
fn fragment_box_at(fragment_boxes: &[f32], fragment: i32) -> Option<[f32; BOX_STRIDE]> {
    let base = usize::try_from(fragment).ok()?.checked_mul(BOX_STRIDE)?;
    let slice = fragment_boxes.get(base..base.checked_add(BOX_STRIDE)?)?;
    let mut bounds = [0.0; BOX_STRIDE];
    bounds.copy_from_slice(slice);
    Some(bounds)
}

fn call_visitor(
    callback: &Function,
    id: i32,
    db_id: i32,
    index: usize,
    failure: &mut Option<JsValue>,
) -> ControlFlow<()> {
    let result = callback.call3(
        &JsValue::NULL,
        &JsValue::from(id),
        &JsValue::from(db_id),
        &JsValue::from(index as u32),
    );
    match result {
        Ok(ret) if ret.is_truthy() => ControlFlow::Break(()),
        Ok(_) => ControlFlow::Continue(()),
        Err(err) => {
            *failure = Some(err);
            ControlFlow::Break(())
        }
    }
}
