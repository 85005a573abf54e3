// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build configuration for [`NodeArray`](crate::NodeArray).

use serde::{Deserialize, Serialize};

/// What to do when a node's children do not fit in the pre-sized children buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Reject the node with [`Error::ChildCapacityExceeded`](crate::Error::ChildCapacityExceeded).
    #[default]
    Strict,
    /// Log a warning and let the buffer reallocate.
    Grow,
}

/// Sizing hints and policies for a single hierarchy load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Expected number of objects (nodes) in the hierarchy
    pub object_count: usize,
    /// Expected number of geometry fragments referenced by leaves
    pub fragment_count: usize,
    /// Overflow handling for the children buffer
    pub capacity_policy: CapacityPolicy,
}

impl BuildConfig {
    pub fn new(object_count: usize, fragment_count: usize) -> Self {
        Self {
            object_count,
            fragment_count,
            ..Self::default()
        }
    }

    /// Children buffer size: every object may appear once as a child and
    /// every fragment once under a leaf.
    #[inline]
    pub fn child_capacity(&self) -> usize {
        self.object_count + self.fragment_count
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            object_count: 0,
            fragment_count: 0,
            capacity_policy: CapacityPolicy::Strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_capacity_sums_hints() {
        let config = BuildConfig::new(10, 25);
        assert_eq!(config.child_capacity(), 35);
        assert_eq!(config.capacity_policy, CapacityPolicy::Strict);
    }

    #[test]
    fn policy_serializes_snake_case() {
        let json = serde_json::to_string(&CapacityPolicy::Grow).unwrap();
        assert_eq!(json, "\"grow\"");
        let config: BuildConfig = serde_json::from_str(
            r#"{"object_count":3,"fragment_count":4,"capacity_policy":"strict"}"#,
        )
        .unwrap();
        assert_eq!(config.child_capacity(), 7);
    }
}
