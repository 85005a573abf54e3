// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known node flag bits.
//!
//! The tree itself treats flags as an opaque 32-bit word. The low three bits
//! carry the node type written by the hierarchy loader; the high bits are
//! runtime state toggled by the viewer through
//! [`InstanceTreeAccess::set_node_flags`](crate::InstanceTreeAccess::set_node_flags).

/// Mask for the node type stored in the low bits.
pub const NODE_TYPE_BITS: u32 = 0x7;
/// Node cannot be picked.
pub const NODE_FLAG_NOSELECT: u32 = 0x2000_0000;
/// Node is switched off (layer off, not rendered at all).
pub const NODE_FLAG_OFF: u32 = 0x4000_0000;
/// Node is hidden by the user.
pub const NODE_FLAG_HIDE: u32 = 0x8000_0000;

/// Node type encoded in the low bits of the flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Assembly = 0,
    Insert = 1,
    Layer = 2,
    Collection = 3,
    Composite = 4,
    Model = 5,
    Geometry = 6,
}

impl NodeType {
    /// Decodes the node type from a flags word. The unused value 7 maps to `None`.
    pub fn from_flags(flags: u32) -> Option<Self> {
        match flags & NODE_TYPE_BITS {
            0 => Some(NodeType::Assembly),
            1 => Some(NodeType::Insert),
            2 => Some(NodeType::Layer),
            3 => Some(NodeType::Collection),
            4 => Some(NodeType::Composite),
            5 => Some(NodeType::Model),
            6 => Some(NodeType::Geometry),
            _ => None,
        }
    }

    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Assembly => "Assembly",
            NodeType::Insert => "Insert",
            NodeType::Layer => "Layer",
            NodeType::Collection => "Collection",
            NodeType::Composite => "Composite",
            NodeType::Model => "Model",
            NodeType::Geometry => "Geometry",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `flags` with `bit` set or cleared.
#[inline]
pub fn with_bit(flags: u32, bit: u32, on: bool) -> u32 {
    if on {
        flags | bit
    } else {
        flags & !bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_ignores_state_bits() {
        let flags = NODE_FLAG_HIDE | NODE_FLAG_OFF | 6;
        assert_eq!(NodeType::from_flags(flags), Some(NodeType::Geometry));
        assert_eq!(NodeType::from_flags(7), None);
    }

    #[test]
    fn with_bit_toggles_only_that_bit() {
        let flags = with_bit(NodeType::Layer as u32, NODE_FLAG_HIDE, true);
        assert_eq!(flags, 0x8000_0002);
        assert_eq!(with_bit(flags, NODE_FLAG_HIDE, false), 2);
    }

    #[test]
    fn node_type_names() {
        assert_eq!(NodeType::Assembly.to_string(), "Assembly");
        assert_eq!(NodeType::Composite.as_str(), "Composite");
    }
}
