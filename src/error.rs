//! Error types.
//!
//! [`DuplicateKeyError`] and [`KeyNotFoundError`] are the only errors a caller sees from
//! normal operation, and both guarantee the tree and catalog were left untouched.
//! [`InvariantViolation`] describes a structural bug and is produced only by
//! [`CatalogTree::check_invariants`](crate::CatalogTree::check_invariants).

use thiserror::Error;

use crate::view::NodeId;

/// Returned by [`CatalogTree::insert`](crate::CatalogTree::insert) when the key is
/// already catalogued. Nothing was changed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("key {key:?} already exists")]
pub struct DuplicateKeyError<K> {
    /// The rejected key.
    pub key: K,
}

/// Returned by [`CatalogTree::delete`](crate::CatalogTree::delete) when the key is not
/// catalogued. Nothing was changed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("key {key:?} not found")]
pub struct KeyNotFoundError<K> {
    /// The missing key.
    pub key: K,
}

/// Invalid [`TreeConfig`](crate::TreeConfig) parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    /// The minimum degree must be at least 2.
    #[error("minimum degree must be at least 2, got {0}")]
    MinDegreeTooSmall(usize),
    /// The minimum degree is so large that `2t - 1` does not fit in a `usize`.
    #[error("minimum degree must be at most {max}, got {got}")]
    MinDegreeTooLarge { got: usize, max: usize },
}

/// A broken structural invariant.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    /// A node holds fewer or more keys than its position allows.
    #[error("{node} holds {count} keys, allowed {min}..={max}")]
    KeyCountOutOfBounds {
        node: NodeId,
        count: usize,
        min: usize,
        max: usize,
    },
    /// An internal node does not have exactly one more child than keys.
    #[error("{node} has {keys} keys but {children} children")]
    ChildCountMismatch { node: NodeId, keys: usize, children: usize },
    /// A leaf carries child links.
    #[error("leaf {node} has {children} children")]
    LeafWithChildren { node: NodeId, children: usize },
    /// Keys and record handles are not index-aligned.
    #[error("{node} has {keys} keys but {records} records")]
    RecordCountMismatch { node: NodeId, keys: usize, records: usize },
    /// Keys within a node are not strictly increasing.
    #[error("{node} keys not strictly increasing at index {index}")]
    UnsortedKeys { node: NodeId, index: usize },
    /// A key falls outside the range its parent's separators allow.
    #[error("{node} key at index {index} escapes its parent's separator range")]
    SeparatorViolation { node: NodeId, index: usize },
    /// Leaves sit at different depths.
    #[error("leaf {node} at depth {depth}, expected {expected}")]
    UnevenLeafDepth { node: NodeId, depth: usize, expected: usize },
    /// The root exists but holds no keys after an operation completed.
    #[error("root {node} is empty")]
    EmptyRoot { node: NodeId },
    /// Nodes are allocated that no traversal reaches.
    #[error("{allocated} nodes allocated but only {reachable} reachable")]
    LeakedNodes { allocated: usize, reachable: usize },
    /// The catalog and the tree disagree on which keys exist.
    #[error("catalog holds {catalog} keys but the tree holds {tree}")]
    CatalogMismatch { catalog: usize, tree: usize },
    /// A node points at a different record than the catalog has for that key.
    #[error("{node} record at index {index} does not match the catalog")]
    RecordMismatch { node: NodeId, index: usize },
}
