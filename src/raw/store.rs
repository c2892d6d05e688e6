use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;
use crate::view::NodeId;

/// Owns every node of one tree and stamps each new node with a fresh [`NodeId`].
///
/// Ids are monotonic for the lifetime of the store, including across [`clear`], so a
/// visualizer holding an id from an earlier snapshot can never confuse it with a node
/// created later in a reused slot.
///
/// [`clear`]: NodeStore::clear
#[derive(Clone, Debug)]
pub(crate) struct NodeStore<K> {
    nodes: Arena<Node<K>>,
    next_id: u64,
}

impl<K> NodeStore<K> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            next_id: 1,
        }
    }

    /// Number of live nodes.
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn alloc_leaf(&mut self) -> Handle {
        let id = self.next_id();
        self.nodes.alloc(Node::new_leaf(id))
    }

    pub(crate) fn alloc_internal(&mut self) -> Handle {
        let id = self.next_id();
        self.nodes.alloc(Node::new_internal(id))
    }

    /// Splits the node at `handle` around `at` and stores the new right sibling.
    /// Returns the promoted median entry and the sibling's handle.
    pub(crate) fn split(&mut self, handle: Handle, at: usize) -> ((K, Handle), Handle) {
        let id = self.next_id();
        let (median, right) = self.nodes.get_mut(handle).split_off(at, id);
        (median, self.nodes.alloc(right))
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.nodes.get_mut(handle)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.nodes.contains(handle)
    }

    /// Detaches a node, handing it back by value (used when a sibling is merged away).
    pub(crate) fn take(&mut self, handle: Handle) -> Node<K> {
        self.nodes.take(handle)
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        self.nodes.free(handle);
    }

    /// Drops every node. Id assignment continues from where it was.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}
