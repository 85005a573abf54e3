// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for instance tree construction and import.

/// Result type alias for instance tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, importing or querying an instance tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Writing a node's children would run past the pre-sized children buffer.
    #[error("children buffer overflow: {required} slots required, capacity is {capacity}")]
    ChildCapacityExceeded { required: usize, capacity: usize },

    /// A dbId was never registered with the tree.
    #[error("dbId {0} is not registered in the instance tree")]
    UnknownDbId(i32),

    /// Flattened buffers are inconsistent with each other.
    #[error("invalid instance tree layout: {0}")]
    InvalidLayout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
