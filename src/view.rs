//! Read-only snapshots of tree structure for external visualizers.
//!
//! A [`TreeView`] is a detached copy: it owns clones of the keys, carries no borrows
//! into the tree, and reflects exactly the state after the last completed operation.

use alloc::vec::Vec;
use core::fmt;

/// Stable identity of a tree node.
///
/// Ids are assigned from a per-tree counter when a node is created (by the first
/// insert, a split, or a new root) and are never reused, so they are safe to use as
/// keys for highlighting or animation. They carry no ordering meaning.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// One node of a [`TreeView`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeView<K> {
    /// The node's identity.
    pub id: NodeId,
    /// Keys in ascending order.
    pub keys: Vec<K>,
    /// Child ids, left to right. Empty for leaves.
    pub children: Vec<NodeId>,
    /// Whether this node is a leaf.
    pub is_leaf: bool,
    /// Distance from the root; the root is at depth 0.
    pub depth: usize,
}

/// A breadth-first snapshot of the whole tree.
///
/// # Examples
///
/// ```
/// use catalog_btree::CatalogTree;
///
/// let mut tree = CatalogTree::with_min_degree(2).unwrap();
/// for key in [10, 20, 30, 40] {
///     tree.insert(key, ()).unwrap();
/// }
///
/// let view = tree.snapshot();
/// assert_eq!(view.height(), 2);
/// assert_eq!(view.root_node().unwrap().keys, vec![20]);
/// assert_eq!(view.in_order_keys(), vec![10, 20, 30, 40]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeView<K> {
    /// Minimum degree `t` of the tree the snapshot was taken from.
    pub min_degree: usize,
    /// Id of the root node, `None` for an empty tree.
    pub root: Option<NodeId>,
    /// Every node, level by level, left to right.
    pub nodes: Vec<NodeView<K>>,
}

impl<K> TreeView<K> {
    /// Returns true if the tree had no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels; 0 for an empty tree, 1 for a lone root leaf.
    #[must_use]
    pub fn height(&self) -> usize {
        self.nodes.last().map_or(0, |n| n.depth + 1)
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeView<K>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the root node, if any.
    #[must_use]
    pub fn root_node(&self) -> Option<&NodeView<K>> {
        self.nodes.first()
    }

    /// Iterates the nodes at `depth`, left to right.
    pub fn level(&self, depth: usize) -> impl Iterator<Item = &NodeView<K>> {
        self.nodes.iter().filter(move |n| n.depth == depth)
    }

    /// Collects every key by in-order traversal.
    #[must_use]
    pub fn in_order_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_in_order(root, &mut out);
        }
        out
    }

    fn collect_in_order(&self, id: NodeId, out: &mut Vec<K>)
    where
        K: Clone,
    {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.is_leaf {
            out.extend(node.keys.iter().cloned());
            return;
        }
        for (i, &child) in node.children.iter().enumerate() {
            self.collect_in_order(child, out);
            if let Some(key) = node.keys.get(i) {
                out.push(key.clone());
            }
        }
    }
}
