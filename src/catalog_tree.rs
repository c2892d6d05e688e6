//! The public B-tree catalog.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::config::TreeConfig;
use crate::error::{ConfigError, DuplicateKeyError, InvariantViolation, KeyNotFoundError};
use crate::event::{Operation, OperationKind, TreeEvent, TreeObserver};
use crate::raw::{RawBTree, Trace};
use crate::view::{NodeId, TreeView};

/// A successful [`CatalogTree::search`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchHit<'a, R> {
    /// The record attached to the key.
    pub record: &'a R,
    /// The node holding the key.
    pub node: NodeId,
    /// Position of the key within that node.
    pub index: usize,
    /// Nodes visited from the root to `node`, inclusive.
    pub path: Vec<NodeId>,
}

/// The full search route, reported for hits and misses alike.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchTrace {
    /// Nodes visited from the root. On a miss this ends at the leaf where the key would
    /// be inserted; for an empty tree it is empty.
    pub path: Vec<NodeId>,
    /// Node and index of the key, if present.
    pub hit: Option<(NodeId, usize)>,
}

/// An ordered catalog of records indexed by a B-tree of minimum degree `t`.
///
/// Every non-root node holds between `t - 1` and `2t - 1` keys, all leaves sit at the
/// same depth, and an in-order walk yields strictly increasing keys. Insert splits full
/// nodes on the way down; delete borrows from or merges with siblings on the way down,
/// so both finish in a single root-to-leaf pass touching `O(log n)` nodes.
///
/// Next to the tree sits a key → record index (the catalog) used for membership checks
/// and direct lookups. The two always hold the same set of keys. Operations that fail
/// ([`DuplicateKeyError`], [`KeyNotFoundError`]) change neither.
///
/// Structural changes are reported to an optional [`TreeObserver`], and the last
/// completed mutation is kept as an [`Operation`] whose `Display` narrates it.
///
/// A `CatalogTree` is a single-writer structure. To share one between threads, wrap the
/// whole tree in one lock; rebalancing touches arbitrarily many nodes along a path.
///
/// # Examples
///
/// ```
/// use catalog_btree::{CatalogTree, TreeEvent};
///
/// let mut tree = CatalogTree::with_min_degree(2).unwrap();
/// tree.insert(50, "Data Structures and Algorithms").unwrap();
/// tree.insert(25, "Introduction to Programming").unwrap();
/// tree.insert(75, "Advanced Database Systems").unwrap();
///
/// // A fourth key overflows the root (`2t - 1 = 3` keys).
/// tree.insert(15, "Computer Networks").unwrap();
/// let op = tree.last_operation().unwrap();
/// assert!(matches!(op.events[0], TreeEvent::RootSplit { .. }));
/// assert_eq!(op.to_string(), "Root split occurred while inserting key 15.");
///
/// let hit = tree.search(&25).unwrap();
/// assert_eq!(*hit.record, "Introduction to Programming");
/// assert_eq!(hit.path.len(), 2);
///
/// assert!(tree.insert(25, "again").is_err());
/// assert_eq!(tree.delete(&50), Ok("Data Structures and Algorithms"));
/// assert!(tree.delete(&50).is_err());
/// ```
pub struct CatalogTree<K, R> {
    tree: RawBTree<K>,
    catalog: Catalog<K, R>,
    config: TreeConfig,
    observer: Option<Box<dyn TreeObserver<K>>>,
    last_operation: Option<Operation<K>>,
}

impl<K: Ord + Clone, R> CatalogTree<K, R> {
    /// Creates an empty tree with the default [`TreeConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty tree with the given config.
    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            tree: RawBTree::new(config.min_degree()),
            catalog: Catalog::new(),
            config,
            observer: None,
            last_operation: None,
        }
    }

    /// Creates an empty tree of minimum degree `t`, otherwise using defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `min_degree` is below 2 or above
    /// [`MAX_MIN_DEGREE`](crate::config::MAX_MIN_DEGREE).
    pub fn with_min_degree(min_degree: usize) -> Result<Self, ConfigError> {
        Ok(Self::with_config(TreeConfig::new(min_degree)?))
    }

    /// Attaches an observer, replacing any previous one.
    #[must_use]
    pub fn with_observer(mut self, observer: impl TreeObserver<K> + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    /// Attaches an observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl TreeObserver<K> + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Detaches the observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// The config the tree was created with.
    #[must_use]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The minimum degree `t`.
    #[must_use]
    pub fn min_degree(&self) -> usize {
        self.tree.min_degree()
    }

    /// Number of catalogued keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Returns true if nothing is catalogued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Number of tree levels; 0 when empty.
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Number of tree nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    /// The most recent successful mutation, if any.
    #[must_use]
    pub fn last_operation(&self) -> Option<&Operation<K>> {
        self.last_operation.as_ref()
    }

    /// Inserts `key` with its record.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKeyError`] if `key` is already catalogued; the tree, the catalog
    /// and [`last_operation`](CatalogTree::last_operation) are left unchanged.
    ///
    /// # Complexity
    ///
    /// O(t · log n)
    pub fn insert(&mut self, key: K, record: R) -> Result<(), DuplicateKeyError<K>> {
        if self.catalog.contains_key(&key) {
            warn!(len = self.catalog.len(), "catalog.insert.duplicate");
            return Err(DuplicateKeyError { key });
        }

        let handle = self.catalog.insert(key.clone(), record);
        let mut events = Vec::new();
        let displaced = self.tree.insert(key.clone(), handle, &mut events);
        debug_assert!(displaced.is_none(), "tree held a key the catalog did not");

        self.complete(OperationKind::Insert, Some(key), events);
        Ok(())
    }

    /// Removes `key`, returning its record.
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFoundError`] if `key` is not catalogued; nothing is changed.
    ///
    /// # Complexity
    ///
    /// O(t · log n)
    pub fn delete(&mut self, key: &K) -> Result<R, KeyNotFoundError<K>> {
        let Some(expected) = self.catalog.handle_of(key) else {
            warn!(len = self.catalog.len(), "catalog.delete.missing");
            return Err(KeyNotFoundError { key: key.clone() });
        };

        let mut events = Vec::new();
        let removed = self.tree.remove(key, &mut events);
        debug_assert_eq!(removed, Some(expected), "tree and catalog disagree on the record");

        let record = self.catalog.remove(key).expect("catalog entry checked above");
        self.complete(OperationKind::Delete, Some(key.clone()), events);
        Ok(record)
    }

    /// Discards every key and record.
    ///
    /// Node ids keep counting up, so ids from snapshots taken before the reset never
    /// reappear.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.catalog.clear();
        self.complete(OperationKind::Reset, None, alloc::vec![TreeEvent::Reset]);
    }

    /// Looks `key` up by descending the tree.
    ///
    /// # Complexity
    ///
    /// O(log t · log n)
    #[must_use]
    pub fn search(&self, key: &K) -> Option<SearchHit<'_, R>> {
        let Trace { path, hit } = self.tree.trace(key);
        let Some((handle, index)) = hit else {
            trace!(depth = path.len(), "tree.search.miss");
            return None;
        };
        let node = self.tree.node(handle);
        trace!(depth = path.len(), "tree.search.hit");

        Some(SearchHit {
            record: self.catalog.record(node.record(index)),
            node: node.id(),
            index,
            path: path.iter().map(|&h| self.tree.node(h).id()).collect(),
        })
    }

    /// Reports the route a search for `key` takes, whether or not it is present.
    #[must_use]
    pub fn trace(&self, key: &K) -> SearchTrace {
        let Trace { path, hit } = self.tree.trace(key);
        SearchTrace {
            path: path.iter().map(|&h| self.tree.node(h).id()).collect(),
            hit: hit.map(|(h, i)| (self.tree.node(h).id(), i)),
        }
    }

    /// Looks `key` up in the catalog without walking the tree.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&R> {
        self.catalog.get(key)
    }

    /// Returns true if `key` is catalogued.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.catalog.contains_key(key)
    }

    /// Iterates every entry in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &R)> {
        self.catalog.iter()
    }

    /// Returns the entries held by one node, in key order, or `None` if no live node has
    /// that id.
    #[must_use]
    pub fn node_entries(&self, id: NodeId) -> Option<Vec<(&K, &R)>> {
        let node = self.tree.node(self.tree.find_node(id)?);
        Some(
            node.keys()
                .iter()
                .enumerate()
                .map(|(i, k)| (k, self.catalog.record(node.record(i))))
                .collect(),
        )
    }

    /// Copies the current tree shape out for rendering.
    #[must_use]
    pub fn snapshot(&self) -> TreeView<K> {
        self.tree.snapshot()
    }

    /// Checks every structural invariant and that the catalog matches the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let tree_keys = self.tree.check_invariants()?;
        if tree_keys != self.catalog.len() || self.catalog.record_count() != self.catalog.len() {
            return Err(InvariantViolation::CatalogMismatch {
                catalog: self.catalog.len(),
                tree: tree_keys,
            });
        }

        for (key, record) in self.tree.entries() {
            if self.catalog.handle_of(key) != Some(record) {
                let (handle, index) = self.tree.search(key).expect("entry came from the tree");
                return Err(InvariantViolation::RecordMismatch {
                    node: self.tree.node(handle).id(),
                    index,
                });
            }
        }
        Ok(())
    }

    fn complete(&mut self, kind: OperationKind, key: Option<K>, events: Vec<TreeEvent>) {
        if self.config.verify_invariants() {
            if let Err(violation) = self.check_invariants() {
                panic!("B-tree invariant violated after {kind:?}: {violation}");
            }
        }

        debug!(
            ?kind,
            events = events.len(),
            len = self.catalog.len(),
            height = self.tree.height(),
            "tree.operation.complete"
        );

        let operation = Operation { kind, key, events };
        if let Some(observer) = self.observer.as_mut() {
            for event in &operation.events {
                observer.on_event(event);
            }
            observer.on_operation(&operation);
        }
        self.last_operation = Some(operation);
    }
}

impl<K: Ord + Clone, R> Default for CatalogTree<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, R: fmt::Debug> fmt::Debug for CatalogTree<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogTree")
            .field("config", &self.config)
            .field("tree", &self.tree)
            .field("catalog", &self.catalog)
            .field("observer", &self.observer.is_some())
            .field("last_operation", &self.last_operation)
            .finish()
    }
}
