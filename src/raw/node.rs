use core::mem;

use smallvec::SmallVec;

use super::handle::Handle;
use crate::view::NodeId;

// Nodes up to minimum degree 4 (`2t - 1 = 7` keys) stay inline; larger degrees spill to the heap.
pub(crate) const INLINE_KEYS: usize = 7;
pub(crate) const INLINE_CHILDREN: usize = INLINE_KEYS + 1;

/// A B-tree node: ordered keys, the record handle attached to each key, and (for
/// internal nodes) one more child than keys.
///
/// Nothing here knows about the minimum degree; the engine decides when a node is
/// full, deficient, or able to lend. The node only offers the index-level edits the
/// engine composes into splits, borrows and merges.
#[derive(Clone, Debug)]
pub(crate) struct Node<K> {
    id: NodeId,
    leaf: bool,
    keys: SmallVec<[K; INLINE_KEYS]>,
    records: SmallVec<[Handle; INLINE_KEYS]>,
    children: SmallVec<[Handle; INLINE_CHILDREN]>,
}

/// Result of searching for a key in a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; the index is where it would be inserted, which is also the
    /// child to descend into.
    NotFound(usize),
}

impl<K> Node<K> {
    /// Creates a new empty leaf node.
    pub(crate) fn new_leaf(id: NodeId) -> Self {
        Self {
            id,
            leaf: true,
            keys: SmallVec::new(),
            records: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    /// Creates a new empty internal node.
    pub(crate) fn new_internal(id: NodeId) -> Self {
        Self {
            leaf: false,
            ..Self::new_leaf(id)
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn record(&self, index: usize) -> Handle {
        self.records[index]
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn first_child(&self) -> Option<Handle> {
        self.children.first().copied()
    }

    pub(crate) fn last_child(&self) -> Option<Handle> {
        self.children.last().copied()
    }

    /// Searches for a key in this node.
    #[inline]
    pub(crate) fn search(&self, key: &K) -> SearchResult
    where
        K: Ord,
    {
        match self.keys.binary_search(key) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Inserts a key and its record at `index`, shifting later entries right.
    pub(crate) fn insert_entry(&mut self, index: usize, key: K, record: Handle) {
        self.keys.insert(index, key);
        self.records.insert(index, record);
    }

    /// Removes the key and record at `index`.
    pub(crate) fn remove_entry(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let record = self.records.remove(index);
        (key, record)
    }

    /// Overwrites the entry at `index`, returning the previous one.
    pub(crate) fn replace_entry(&mut self, index: usize, key: K, record: Handle) -> (K, Handle) {
        let old_key = mem::replace(&mut self.keys[index], key);
        let old_record = mem::replace(&mut self.records[index], record);
        (old_key, old_record)
    }

    /// Replaces the record handle at `index`, returning the previous one.
    pub(crate) fn set_record(&mut self, index: usize, record: Handle) -> Handle {
        mem::replace(&mut self.records[index], record)
    }

    pub(crate) fn push_entry(&mut self, key: K, record: Handle) {
        self.keys.push(key);
        self.records.push(record);
    }

    pub(crate) fn pop_entry(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let record = self.records.pop()?;
        Some((key, record))
    }

    pub(crate) fn pop_front_entry(&mut self) -> Option<(K, Handle)> {
        if self.keys.is_empty() {
            None
        } else {
            Some(self.remove_entry(0))
        }
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Handle) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Handle {
        self.children.remove(index)
    }

    pub(crate) fn push_child(&mut self, child: Handle) {
        self.children.push(child);
    }

    pub(crate) fn pop_child(&mut self) -> Option<Handle> {
        self.children.pop()
    }

    pub(crate) fn pop_front_child(&mut self) -> Option<Handle> {
        if self.children.is_empty() {
            None
        } else {
            Some(self.children.remove(0))
        }
    }

    /// Splits a full node around `at`.
    ///
    /// Keys `[at + 1..]` (and, for internal nodes, children `[at + 1..]`) move to a new
    /// right sibling with the same leaf flag; the entry at `at` is returned as the
    /// median to promote. `self` keeps keys `[..at]`.
    pub(crate) fn split_off(&mut self, at: usize, right_id: NodeId) -> ((K, Handle), Node<K>) {
        let mut right = if self.leaf {
            Node::new_leaf(right_id)
        } else {
            Node::new_internal(right_id)
        };

        right.keys = self.keys.drain(at + 1..).collect();
        right.records = self.records.drain(at + 1..).collect();
        if !self.leaf {
            right.children = self.children.drain(at + 1..).collect();
        }

        let median = self.remove_entry(at);
        (median, right)
    }

    /// Appends the separator and every entry (and child) of `right`, which must be this
    /// node's immediate right sibling.
    pub(crate) fn absorb(&mut self, separator: (K, Handle), mut right: Node<K>) {
        debug_assert_eq!(self.leaf, right.leaf, "merging nodes from different levels");
        self.push_entry(separator.0, separator.1);
        self.keys.append(&mut right.keys);
        self.records.append(&mut right.records);
        self.children.append(&mut right.children);
    }
}
