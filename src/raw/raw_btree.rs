use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cmp::Ordering;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::handle::Handle;
use super::node::{Node, SearchResult};
use super::store::NodeStore;
use crate::error::InvariantViolation;
use crate::event::{Replacement, Side, TreeEvent};
use crate::view::{NodeId, NodeView, TreeView};

/// Nodes visited from the root down, in visiting order.
pub(crate) type Path = SmallVec<[Handle; 16]>;

/// Outcome of a traced search.
pub(crate) struct Trace {
    /// Every node visited, root first.
    pub(crate) path: Path,
    /// Node and key index of the match, if any.
    pub(crate) hit: Option<(Handle, usize)>,
}

/// The B-tree engine of minimum degree `t`.
///
/// Keys live in every node (not only leaves) next to a handle for their record. All
/// mutations are single top-down passes: insert splits full nodes before entering them,
/// and delete tops up minimal nodes before entering them, so neither ever has to walk
/// back up. Both expect the caller to have checked membership first; see
/// [`insert`](RawBTree::insert) and [`remove`](RawBTree::remove).
#[derive(Clone, Debug)]
pub(crate) struct RawBTree<K> {
    store: NodeStore<K>,
    root: Option<Handle>,
    min_degree: usize,
}

impl<K> RawBTree<K> {
    pub(crate) const fn new(min_degree: usize) -> Self {
        Self {
            store: NodeStore::new(),
            root: None,
            min_degree,
        }
    }

    pub(crate) const fn min_degree(&self) -> usize {
        self.min_degree
    }

    pub(crate) const fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    pub(crate) const fn min_keys(&self) -> usize {
        self.min_degree - 1
    }

    #[cfg(test)]
    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes.
    pub(crate) const fn node_count(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.store.get(handle)
    }

    fn id(&self, handle: Handle) -> NodeId {
        self.store.get(handle).id()
    }

    fn key_count(&self, handle: Handle) -> usize {
        self.store.get(handle).key_count()
    }

    fn is_full(&self, handle: Handle) -> bool {
        self.key_count(handle) == self.max_keys()
    }

    /// Number of levels; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = self.store.get(handle).first_child();
        }
        height
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.root = None;
    }

    /// Finds the node carrying `id`.
    pub(crate) fn find_node(&self, id: NodeId) -> Option<Handle> {
        let mut stack: Vec<Handle> = self.root.into_iter().collect();
        while let Some(handle) = stack.pop() {
            let node = self.store.get(handle);
            if node.id() == id {
                return Some(handle);
            }
            stack.extend_from_slice(node.children());
        }
        None
    }

    /// Every key with its record handle, in key order.
    pub(crate) fn entries(&self) -> Vec<(&K, Handle)> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect_entries(root, &mut out);
        }
        out
    }

    fn collect_entries<'a>(&'a self, handle: Handle, out: &mut Vec<(&'a K, Handle)>) {
        let node = self.store.get(handle);
        for i in 0..node.key_count() {
            if !node.is_leaf() {
                self.collect_entries(node.child(i), out);
            }
            out.push((node.key(i), node.record(i)));
        }
        if let Some(last) = node.last_child() {
            self.collect_entries(last, out);
        }
    }
}

impl<K: Ord + Clone> RawBTree<K> {
    /// Looks `key` up, returning its node and index.
    pub(crate) fn search(&self, key: &K) -> Option<(Handle, usize)> {
        let mut current = self.root?;
        loop {
            let node = self.store.get(current);
            match node.search(key) {
                SearchResult::Found(idx) => return Some((current, idx)),
                SearchResult::NotFound(_) if node.is_leaf() => return None,
                SearchResult::NotFound(idx) => current = node.child(idx),
            }
        }
    }

    /// Like [`search`](RawBTree::search), also recording every node visited. On a miss
    /// the path ends at the leaf where the key would live.
    pub(crate) fn trace(&self, key: &K) -> Trace {
        let mut path = Path::new();
        let Some(mut current) = self.root else {
            return Trace { path, hit: None };
        };

        loop {
            path.push(current);
            let node = self.store.get(current);
            match node.search(key) {
                SearchResult::Found(idx) => {
                    return Trace {
                        path,
                        hit: Some((current, idx)),
                    };
                }
                SearchResult::NotFound(_) if node.is_leaf() => return Trace { path, hit: None },
                SearchResult::NotFound(idx) => current = node.child(idx),
            }
        }
    }

    /// Inserts `key` with its record handle.
    ///
    /// The caller is expected to have rejected duplicates beforehand, since splits on the
    /// way down happen before the key's presence is known. If the key turns up anyway
    /// its record handle is swapped in place and the old one is returned.
    pub(crate) fn insert(&mut self, key: K, record: Handle, events: &mut Vec<TreeEvent>) -> Option<Handle> {
        let Some(mut current) = self.root else {
            let leaf = self.store.alloc_leaf();
            self.store.get_mut(leaf).push_entry(key, record);
            self.root = Some(leaf);

            let node = self.id(leaf);
            debug!(%node, "tree.insert.root_created");
            events.push(TreeEvent::RootCreated { node });
            events.push(TreeEvent::LeafInsert { node, index: 0 });
            return None;
        };

        if self.is_full(current) {
            let new_root = self.store.alloc_internal();
            self.store.get_mut(new_root).push_child(current);
            let sibling = self.split_child(new_root, 0);
            self.root = Some(new_root);

            let event = TreeEvent::RootSplit {
                old_root: self.id(current),
                new_root: self.id(new_root),
                sibling: self.id(sibling),
            };
            debug!(new_root = %self.id(new_root), "tree.insert.root_split");
            events.push(event);
            current = new_root;
        }

        loop {
            let node = self.store.get(current);
            let mut index = match node.search(&key) {
                SearchResult::Found(idx) => return Some(self.store.get_mut(current).set_record(idx, record)),
                SearchResult::NotFound(idx) => idx,
            };

            if node.is_leaf() {
                self.store.get_mut(current).insert_entry(index, key, record);
                let node = self.id(current);
                trace!(%node, index, "tree.insert.leaf");
                events.push(TreeEvent::LeafInsert { node, index });
                return None;
            }

            let child = node.child(index);
            if self.is_full(child) {
                let sibling = self.split_child(current, index);
                events.push(TreeEvent::NodeSplit {
                    node: self.id(child),
                    sibling: self.id(sibling),
                    parent: self.id(current),
                });

                match key.cmp(self.store.get(current).key(index)) {
                    Ordering::Less => {}
                    Ordering::Greater => index += 1,
                    Ordering::Equal => return Some(self.store.get_mut(current).set_record(index, record)),
                }
            }

            current = self.store.get(current).child(index);
        }
    }

    /// Splits the full child at `index` of `parent`, which must not be full itself.
    ///
    /// The child keeps keys `[0, t - 1)`, key `t - 1` moves up into `parent` at `index`,
    /// and keys `[t, 2t - 1)` (plus children `[t, 2t]` if internal) move to a new sibling
    /// placed at `parent.children[index + 1]`. Returns the sibling.
    fn split_child(&mut self, parent: Handle, index: usize) -> Handle {
        let child = self.store.get(parent).child(index);
        debug_assert!(self.is_full(child), "splitting a node that is not full");
        debug_assert!(!self.is_full(parent), "splitting into a full parent");

        let ((key, record), sibling) = self.store.split(child, self.min_degree - 1);
        let parent_node = self.store.get_mut(parent);
        parent_node.insert_entry(index, key, record);
        parent_node.insert_child(index + 1, sibling);

        debug!(
            parent = %self.id(parent),
            node = %self.id(child),
            sibling = %self.id(sibling),
            "tree.insert.split"
        );
        sibling
    }

    /// Removes `key`, returning the record handle that was attached to it.
    ///
    /// Before stepping into a child that holds only `t - 1` keys the child is topped up
    /// by a borrow or a merge, so the node a key is finally removed from always has a
    /// key to spare. A key found in an internal node is overwritten by its predecessor or
    /// successor, which is then deleted from the subtree it came from instead.
    ///
    /// The top-up happens before the key is known to exist, so an absent key may still
    /// reshape the tree (validly). Callers that need a no-op on misses check first.
    pub(crate) fn remove(&mut self, key: &K, events: &mut Vec<TreeEvent>) -> Option<Handle> {
        let mut current = self.root?;
        let mut target = key.clone();
        let mut removed: Option<Handle> = None;

        let outcome = loop {
            let node = self.store.get(current);
            match node.search(&target) {
                SearchResult::Found(index) if node.is_leaf() => {
                    let (_, record) = self.store.get_mut(current).remove_entry(index);
                    let node = self.id(current);
                    trace!(%node, index, "tree.delete.leaf");
                    events.push(TreeEvent::LeafDelete { node, index });
                    break Some(removed.unwrap_or(record));
                }
                SearchResult::Found(index) => {
                    let left = node.child(index);
                    let right = node.child(index + 1);

                    if self.key_count(left) >= self.min_degree {
                        let (pred, pred_record) = self.max_entry(left);
                        let (_, old) = self.store.get_mut(current).replace_entry(index, pred.clone(), pred_record);
                        removed.get_or_insert(old);
                        debug!(node = %self.id(current), "tree.delete.replace_predecessor");
                        events.push(TreeEvent::KeyReplaced {
                            node: self.id(current),
                            source: Replacement::Predecessor,
                        });
                        target = pred;
                        current = left;
                    } else if self.key_count(right) >= self.min_degree {
                        let (succ, succ_record) = self.min_entry(right);
                        let (_, old) = self.store.get_mut(current).replace_entry(index, succ.clone(), succ_record);
                        removed.get_or_insert(old);
                        debug!(node = %self.id(current), "tree.delete.replace_successor");
                        events.push(TreeEvent::KeyReplaced {
                            node: self.id(current),
                            source: Replacement::Successor,
                        });
                        target = succ;
                        current = right;
                    } else {
                        // Both neighbors are minimal: pull the key down between them.
                        self.merge_children(current, index, events);
                        current = left;
                    }
                }
                SearchResult::NotFound(_) if node.is_leaf() => break None,
                SearchResult::NotFound(index) => {
                    let index = if self.key_count(node.child(index)) < self.min_degree {
                        self.fill_child(current, index, events)
                    } else {
                        index
                    };
                    current = self.store.get(current).child(index);
                }
            }
        };

        self.collapse_root(events);
        outcome
    }

    /// Largest entry of the subtree rooted at `handle`.
    fn max_entry(&self, handle: Handle) -> (K, Handle) {
        let mut node = self.store.get(handle);
        while let Some(last) = node.last_child() {
            node = self.store.get(last);
        }
        let index = node.key_count() - 1;
        (node.key(index).clone(), node.record(index))
    }

    /// Smallest entry of the subtree rooted at `handle`.
    fn min_entry(&self, handle: Handle) -> (K, Handle) {
        let mut node = self.store.get(handle);
        while let Some(first) = node.first_child() {
            node = self.store.get(first);
        }
        (node.key(0).clone(), node.record(0))
    }

    /// Brings the minimal child at `index` of `parent` up to at least `t` keys. Returns
    /// the index to descend into, which moves left by one if the child was merged into
    /// its left sibling.
    fn fill_child(&mut self, parent: Handle, index: usize, events: &mut Vec<TreeEvent>) -> usize {
        let parent_node = self.store.get(parent);
        let last = parent_node.key_count();

        if index > 0 && self.key_count(parent_node.child(index - 1)) >= self.min_degree {
            self.borrow_from_left(parent, index, events);
            return index;
        }
        if index < last && self.key_count(parent_node.child(index + 1)) >= self.min_degree {
            self.borrow_from_right(parent, index, events);
            return index;
        }

        if index < last {
            self.merge_children(parent, index, events);
            index
        } else {
            self.merge_children(parent, index - 1, events);
            index - 1
        }
    }

    /// Rotates the left sibling's last key up into `parent` and the parent's separator
    /// down to the front of the child at `index`.
    fn borrow_from_left(&mut self, parent: Handle, index: usize, events: &mut Vec<TreeEvent>) {
        let parent_node = self.store.get(parent);
        let left = parent_node.child(index - 1);
        let child = parent_node.child(index);

        let left_node = self.store.get_mut(left);
        let (key, record) = left_node.pop_entry().expect("lending sibling has spare keys");
        let moved_child = if left_node.is_leaf() { None } else { left_node.pop_child() };

        let (sep_key, sep_record) = self.store.get_mut(parent).replace_entry(index - 1, key, record);

        let child_node = self.store.get_mut(child);
        child_node.insert_entry(0, sep_key, sep_record);
        if let Some(moved) = moved_child {
            child_node.insert_child(0, moved);
        }

        let (from, into) = (self.id(left), self.id(child));
        debug!(%from, %into, "tree.delete.borrow_left");
        events.push(TreeEvent::KeyBorrowed {
            from,
            into,
            side: Side::Left,
        });
    }

    /// Rotates the right sibling's first key up into `parent` and the parent's separator
    /// down to the end of the child at `index`.
    fn borrow_from_right(&mut self, parent: Handle, index: usize, events: &mut Vec<TreeEvent>) {
        let parent_node = self.store.get(parent);
        let child = parent_node.child(index);
        let right = parent_node.child(index + 1);

        let right_node = self.store.get_mut(right);
        let (key, record) = right_node.pop_front_entry().expect("lending sibling has spare keys");
        let moved_child = if right_node.is_leaf() {
            None
        } else {
            right_node.pop_front_child()
        };

        let (sep_key, sep_record) = self.store.get_mut(parent).replace_entry(index, key, record);

        let child_node = self.store.get_mut(child);
        child_node.push_entry(sep_key, sep_record);
        if let Some(moved) = moved_child {
            child_node.push_child(moved);
        }

        let (from, into) = (self.id(right), self.id(child));
        debug!(%from, %into, "tree.delete.borrow_right");
        events.push(TreeEvent::KeyBorrowed {
            from,
            into,
            side: Side::Right,
        });
    }

    /// Folds the child at `index + 1` and the separator at `index` into the child at
    /// `index`, freeing the right child.
    fn merge_children(&mut self, parent: Handle, index: usize, events: &mut Vec<TreeEvent>) {
        let parent_node = self.store.get_mut(parent);
        let separator = parent_node.remove_entry(index);
        let right = parent_node.remove_child(index + 1);
        let left = parent_node.child(index);

        let right_node = self.store.take(right);
        let right_id = right_node.id();
        self.store.get_mut(left).absorb(separator, right_node);

        let left_id = self.id(left);
        debug!(left = %left_id, right = %right_id, "tree.delete.merge");
        events.push(TreeEvent::NodeMerged {
            left: left_id,
            right: right_id,
        });
    }

    /// Drops a keyless root: an empty leaf empties the tree, an internal root hands over
    /// to its only child.
    fn collapse_root(&mut self, events: &mut Vec<TreeEvent>) {
        let Some(root) = self.root else {
            return;
        };
        let node = self.store.get(root);
        if node.key_count() > 0 {
            return;
        }

        let old_root = node.id();
        match node.first_child() {
            None => {
                self.store.free(root);
                self.root = None;
                debug!(%old_root, "tree.delete.emptied");
                events.push(TreeEvent::TreeEmptied);
            }
            Some(child) => {
                self.store.free(root);
                self.root = Some(child);
                let new_root = self.id(child);
                debug!(%old_root, %new_root, "tree.delete.root_collapsed");
                events.push(TreeEvent::RootCollapsed { old_root, new_root });
            }
        }
    }

    /// Copies the structure out breadth-first.
    pub(crate) fn snapshot(&self) -> TreeView<K> {
        let mut nodes = Vec::with_capacity(self.store.len());
        let mut queue: VecDeque<(Handle, usize)> = self.root.map(|r| (r, 0)).into_iter().collect();

        while let Some((handle, depth)) = queue.pop_front() {
            let node = self.store.get(handle);
            queue.extend(node.children().iter().map(|&c| (c, depth + 1)));
            nodes.push(NodeView {
                id: node.id(),
                keys: node.keys().to_vec(),
                children: node.children().iter().map(|&c| self.id(c)).collect(),
                is_leaf: node.is_leaf(),
                depth,
            });
        }

        TreeView {
            min_degree: self.min_degree,
            root: self.root.map(|r| self.id(r)),
            nodes,
        }
    }

    /// Walks the whole tree and checks every structural invariant. Returns the number
    /// of keys on success.
    pub(crate) fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            if !self.store.is_empty() {
                return Err(InvariantViolation::LeakedNodes {
                    allocated: self.store.len(),
                    reachable: 0,
                });
            }
            return Ok(0);
        };

        let mut walk = Walk {
            leaf_depth: None,
            reachable: 0,
        };
        let keys = self.check_node(root, 0, None, None, &mut walk)?;

        if walk.reachable != self.store.len() {
            return Err(InvariantViolation::LeakedNodes {
                allocated: self.store.len(),
                reachable: walk.reachable,
            });
        }
        Ok(keys)
    }

    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
        walk: &mut Walk,
    ) -> Result<usize, InvariantViolation> {
        walk.reachable += 1;
        let node = self.store.get(handle);
        let id = node.id();
        let count = node.key_count();

        if depth == 0 && count == 0 {
            return Err(InvariantViolation::EmptyRoot { node: id });
        }
        let min = if depth == 0 { 1 } else { self.min_keys() };
        if count < min || count > self.max_keys() {
            return Err(InvariantViolation::KeyCountOutOfBounds {
                node: id,
                count,
                min,
                max: self.max_keys(),
            });
        }
        if node.record_count() != count {
            return Err(InvariantViolation::RecordCountMismatch {
                node: id,
                keys: count,
                records: node.record_count(),
            });
        }

        for (index, key) in node.keys().iter().enumerate() {
            if index > 0 && node.key(index - 1) >= key {
                return Err(InvariantViolation::UnsortedKeys { node: id, index });
            }
            if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
                return Err(InvariantViolation::SeparatorViolation { node: id, index });
            }
        }

        if node.is_leaf() {
            if node.child_count() != 0 {
                return Err(InvariantViolation::LeafWithChildren {
                    node: id,
                    children: node.child_count(),
                });
            }
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantViolation::UnevenLeafDepth {
                        node: id,
                        depth,
                        expected,
                    });
                }
                Some(_) => {}
            }
            return Ok(count);
        }

        if node.child_count() != count + 1 {
            return Err(InvariantViolation::ChildCountMismatch {
                node: id,
                keys: count,
                children: node.child_count(),
            });
        }

        let mut total = count;
        for (i, &child) in node.children().iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(node.key(i - 1)) };
            let hi = if i == count { upper } else { Some(node.key(i)) };
            total += self.check_node(child, depth + 1, lo, hi, walk)?;
        }
        Ok(total)
    }
}

/// Accumulator for [`RawBTree::check_invariants`].
struct Walk {
    leaf_depth: Option<usize>,
    reachable: usize,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::vec;
    use proptest::prelude::*;

    fn record_for(key: i32) -> Handle {
        Handle::from_index(key as usize)
    }

    impl RawBTree<i32> {
        fn put(&mut self, key: i32) -> Vec<TreeEvent> {
            let mut events = Vec::new();
            assert!(self.insert(key, record_for(key), &mut events).is_none());
            self.check_invariants().unwrap();
            events
        }

        fn take(&mut self, key: i32) -> (Option<Handle>, Vec<TreeEvent>) {
            let mut events = Vec::new();
            let removed = self.remove(&key, &mut events);
            self.check_invariants().unwrap();
            (removed, events)
        }

        /// Keys per node, level by level.
        fn levels(&self) -> Vec<Vec<Vec<i32>>> {
            let view = self.snapshot();
            (0..view.height())
                .map(|d| view.level(d).map(|n| n.keys.clone()).collect())
                .collect()
        }
    }

    fn build(min_degree: usize, keys: &[i32]) -> RawBTree<i32> {
        let mut tree = RawBTree::new(min_degree);
        for &k in keys {
            tree.put(k);
        }
        tree
    }

    #[test]
    fn first_insert_creates_root_leaf() {
        let mut tree = RawBTree::new(2);
        let events = tree.put(50);
        assert!(matches!(events[0], TreeEvent::RootCreated { .. }));
        assert_eq!(tree.levels(), vec![vec![vec![50]]]);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn sample_books_split_root_once() {
        let mut tree = build(2, &[50, 25, 75]);
        let events = tree.put(15);
        assert!(matches!(events[0], TreeEvent::RootSplit { .. }));

        tree.put(35);
        assert_eq!(tree.levels(), vec![vec![vec![50]], vec![vec![15, 25, 35], vec![75]]]);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn split_below_root_promotes_into_parent() {
        let mut tree = build(2, &[10, 20, 30, 40, 50]);
        assert_eq!(tree.levels(), vec![vec![vec![20]], vec![vec![10], vec![30, 40, 50]]]);

        let events = tree.put(60);
        assert!(matches!(events[0], TreeEvent::NodeSplit { .. }));
        assert_eq!(tree.levels(), vec![vec![vec![20, 40]], vec![vec![10], vec![30], vec![50, 60]]]);
    }

    #[test]
    fn delete_internal_key_uses_successor() {
        let mut tree = build(2, &[10, 20, 30, 40, 50, 60, 70]);
        assert_eq!(tree.levels(), vec![vec![vec![20, 40]], vec![vec![10], vec![30], vec![50, 60, 70]]]);

        let (removed, events) = tree.take(40);
        assert_eq!(removed, Some(record_for(40)));
        assert!(events.iter().any(|e| matches!(
            e,
            TreeEvent::KeyReplaced {
                source: Replacement::Successor,
                ..
            }
        )));
        assert_eq!(tree.levels(), vec![vec![vec![20, 50]], vec![vec![10], vec![30], vec![60, 70]]]);

        // The successor's record moved up with it.
        let (node, idx) = tree.search(&50).unwrap();
        assert_eq!(tree.node(node).record(idx), record_for(50));
    }

    #[test]
    fn delete_internal_key_uses_predecessor() {
        let mut tree = build(2, &[10, 20, 30, 40, 5]);
        assert_eq!(tree.levels(), vec![vec![vec![20]], vec![vec![5, 10], vec![30, 40]]]);

        let (removed, events) = tree.take(20);
        assert_eq!(removed, Some(record_for(20)));
        assert!(matches!(
            events[0],
            TreeEvent::KeyReplaced {
                source: Replacement::Predecessor,
                ..
            }
        ));
        assert_eq!(tree.levels(), vec![vec![vec![10]], vec![vec![5], vec![30, 40]]]);
    }

    #[test]
    fn delete_internal_key_merges_minimal_children_and_collapses_root() {
        let mut tree = build(2, &[10, 20, 30, 40, 50, 60, 70]);
        tree.take(40);
        assert_eq!(tree.levels(), vec![vec![vec![20, 50]], vec![vec![10], vec![30], vec![60, 70]]]);

        let (removed, events) = tree.take(20);
        assert_eq!(removed, Some(record_for(20)));
        assert!(matches!(events[0], TreeEvent::NodeMerged { .. }));
        assert_eq!(tree.levels(), vec![vec![vec![50]], vec![vec![10, 30], vec![60, 70]]]);

        // Merging the root's last two children empties it; the merged child takes over.
        let mut tree = build(2, &[10, 20, 30, 40]);
        tree.take(40);
        let (_, events) = tree.take(30);
        assert!(events.iter().any(|e| matches!(e, TreeEvent::NodeMerged { .. })));
        assert!(events.iter().any(|e| matches!(e, TreeEvent::RootCollapsed { .. })));
        assert_eq!(tree.levels(), vec![vec![vec![10, 20]]]);
    }

    #[test]
    fn descent_borrows_from_sibling() {
        let mut tree = build(2, &[10, 20, 30, 40, 50, 60, 70]);
        // [10] and its only neighbor [30] are both minimal: the walk toward 10 merges them.
        let (_, events) = tree.take(10);
        assert!(events.iter().any(|e| matches!(e, TreeEvent::NodeMerged { .. })));
        assert_eq!(tree.levels(), vec![vec![vec![40]], vec![vec![20, 30], vec![50, 60, 70]]]);

        let mut tree = build(2, &[10, 20, 30, 40, 50, 60, 70]);
        // [30] is minimal, left [10] minimal, right [50, 60, 70] rich: borrow from right.
        let (_, events) = tree.take(30);
        assert!(events.iter().any(|e| matches!(e, TreeEvent::KeyBorrowed { side: Side::Right, .. })));
        assert_eq!(tree.levels(), vec![vec![vec![20, 50]], vec![vec![10], vec![40], vec![60, 70]]]);
    }

    #[test]
    fn descent_borrows_from_left_sibling() {
        let mut tree = build(2, &[50, 60, 70, 80, 10, 20, 30]);
        assert_eq!(tree.levels(), vec![vec![vec![20, 60]], vec![vec![10], vec![30, 50], vec![70, 80]]]);
        tree.take(80);
        assert_eq!(tree.levels(), vec![vec![vec![20, 60]], vec![vec![10], vec![30, 50], vec![70]]]);

        let (_, events) = tree.take(70);
        assert!(events.iter().any(|e| matches!(e, TreeEvent::KeyBorrowed { side: Side::Left, .. })));
        assert_eq!(tree.levels(), vec![vec![vec![20, 50]], vec![vec![10], vec![30], vec![60]]]);
    }

    #[test]
    fn deleting_only_key_empties_tree() {
        let mut tree = build(3, &[42]);
        let (removed, events) = tree.take(42);
        assert_eq!(removed, Some(record_for(42)));
        assert_eq!(events.last(), Some(&TreeEvent::TreeEmptied));
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert!(tree.search(&42).is_none());
    }

    #[test]
    fn missing_key_in_leaf_root_is_noop() {
        let mut tree = build(3, &[1, 2, 3]);
        let (removed, events) = tree.take(9);
        assert!(removed.is_none());
        assert!(events.is_empty());
        assert_eq!(tree.levels(), vec![vec![vec![1, 2, 3]]]);
    }

    #[test]
    fn trace_records_path_on_hit_and_miss() {
        let tree = build(2, &[10, 20, 30, 40, 50, 60, 70]);
        let hit = tree.trace(&60);
        assert_eq!(hit.path.len(), 2);
        let (node, idx) = hit.hit.unwrap();
        assert_eq!(tree.node(node).key(idx), &60);

        let miss = tree.trace(&35);
        assert_eq!(miss.path.len(), 2);
        assert!(miss.hit.is_none());
        assert_eq!(tree.node(miss.path[1]).keys(), &[30]);

        let root_hit = tree.trace(&20);
        assert_eq!(root_hit.path.len(), 1);
    }

    #[test]
    fn entries_and_find_node() {
        let tree = build(2, &[40, 10, 30, 20, 50]);
        let keys: Vec<i32> = tree.entries().iter().map(|(k, _)| **k).collect();
        assert_eq!(keys, vec![10, 20, 30, 40, 50]);
        for (k, record) in tree.entries() {
            assert_eq!(record, record_for(*k));
        }

        let view = tree.snapshot();
        for node in &view.nodes {
            let handle = tree.find_node(node.id).unwrap();
            assert_eq!(tree.node(handle).keys(), node.keys.as_slice());
        }
    }

    #[test]
    fn checker_catches_corruption() {
        let mut tree = build(2, &[10, 20, 30, 40]);
        let root = tree.root().unwrap();
        // Unsort the root's right leaf by hand.
        let right = tree.store.get(root).child(1);
        tree.store.get_mut(right).insert_entry(0, 99, record_for(99));
        assert!(matches!(
            tree.check_invariants(),
            Err(InvariantViolation::UnsortedKeys { .. } | InvariantViolation::SeparatorViolation { .. })
        ));

        let mut tree = build(2, &[10, 20, 30, 40]);
        let orphan = tree.store.alloc_leaf();
        tree.store.get_mut(orphan).push_entry(1, record_for(1));
        assert!(matches!(tree.check_invariants(), Err(InvariantViolation::LeakedNodes { .. })));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..1000).prop_map(Op::Insert),
            2 => (0i32..1000).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn tree_invariants_maintained_after_operations(
            min_degree in 2usize..6,
            ops in prop::collection::vec(op_strategy(), 0..400),
        ) {
            let mut tree: RawBTree<i32> = RawBTree::new(min_degree);
            let mut model: BTreeSet<i32> = BTreeSet::new();

            for op in ops {
                let mut events = Vec::new();
                match op {
                    Op::Insert(key) => {
                        if model.insert(key) {
                            prop_assert!(tree.insert(key, record_for(key), &mut events).is_none());
                        }
                    }
                    Op::Remove(key) => {
                        if model.remove(&key) {
                            prop_assert_eq!(tree.remove(&key, &mut events), Some(record_for(key)));
                        }
                    }
                }
                prop_assert_eq!(tree.check_invariants(), Ok(model.len()));
            }

            let keys: Vec<i32> = tree.entries().iter().map(|(k, _)| **k).collect();
            prop_assert_eq!(keys, model.iter().copied().collect::<Vec<_>>());
        }

        #[test]
        fn delete_everything_in_any_order(
            min_degree in 2usize..5,
            keys in prop::collection::btree_set(0i32..2000, 0..300),
            seed in any::<u64>(),
        ) {
            let mut tree = RawBTree::new(min_degree);
            let mut events = Vec::new();
            for &k in &keys {
                tree.insert(k, record_for(k), &mut events);
            }

            // Deterministic shuffle from the seed.
            let mut order: Vec<i32> = keys.iter().copied().collect();
            let mut x = seed | 1;
            for i in (1..order.len()).rev() {
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                order.swap(i, (x % (i as u64 + 1)) as usize);
            }

            for k in order {
                prop_assert_eq!(tree.remove(&k, &mut events), Some(record_for(k)));
                prop_assert!(tree.check_invariants().is_ok());
                prop_assert!(tree.search(&k).is_none());
            }
            prop_assert!(tree.is_empty());
            prop_assert_eq!(tree.node_count(), 0);
        }
    }
}
