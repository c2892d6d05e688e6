//! Structural events and operation notices.
//!
//! Every structural step of a mutation is reported as a [`TreeEvent`] while it happens,
//! and every successful mutation ends with one [`Operation`] that collects those events.
//! The `Display` impl of [`Operation`] narrates what happened, so a UI can explain the
//! last operation without reconstructing it from snapshots.

use alloc::vec::Vec;
use core::fmt;

use crate::view::NodeId;

/// Which neighbor of an underfull child a key was borrowed from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The sibling before the child.
    Left,
    /// The sibling after the child.
    Right,
}

/// Which neighbor key replaced a key deleted from an internal node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Replacement {
    /// The largest key of the left subtree.
    Predecessor,
    /// The smallest key of the right subtree.
    Successor,
}

/// A single structural step.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TreeEvent {
    /// The first key went into a fresh root leaf.
    RootCreated { node: NodeId },
    /// A full root was split; the tree grew one level.
    RootSplit {
        old_root: NodeId,
        new_root: NodeId,
        sibling: NodeId,
    },
    /// A full non-root node was split on the way down.
    NodeSplit {
        node: NodeId,
        sibling: NodeId,
        parent: NodeId,
    },
    /// A key was placed into a leaf.
    LeafInsert { node: NodeId, index: usize },
    /// A key was removed from a leaf.
    LeafDelete { node: NodeId, index: usize },
    /// A key being deleted from an internal node was overwritten by a neighbor key.
    KeyReplaced { node: NodeId, source: Replacement },
    /// A key (and child, for internal nodes) rotated through the parent into `into`.
    KeyBorrowed { from: NodeId, into: NodeId, side: Side },
    /// `right` and the separating parent key were folded into `left`.
    NodeMerged { left: NodeId, right: NodeId },
    /// The keyless root was dropped and its only child became the root.
    RootCollapsed { old_root: NodeId, new_root: NodeId },
    /// The last key was removed; the tree has no root.
    TreeEmptied,
    /// The tree and catalog were discarded.
    Reset,
}

/// Kind of a completed mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OperationKind {
    /// A key and its record were added.
    Insert,
    /// A key and its record were removed.
    Delete,
    /// Everything was discarded.
    Reset,
}

/// Notice emitted once a mutation has completed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation<K> {
    /// What was done.
    pub kind: OperationKind,
    /// The key involved; `None` for [`OperationKind::Reset`].
    pub key: Option<K>,
    /// Structural steps, in the order they happened.
    pub events: Vec<TreeEvent>,
}

impl<K> Operation<K> {
    /// Counts events matching `pred`.
    pub fn count(&self, pred: impl Fn(&TreeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Number of node splits, including a root split.
    #[must_use]
    pub fn splits(&self) -> usize {
        self.count(|e| matches!(e, TreeEvent::RootSplit { .. } | TreeEvent::NodeSplit { .. }))
    }

    /// Number of merges.
    #[must_use]
    pub fn merges(&self) -> usize {
        self.count(|e| matches!(e, TreeEvent::NodeMerged { .. }))
    }

    /// Number of borrows.
    #[must_use]
    pub fn borrows(&self) -> usize {
        self.count(|e| matches!(e, TreeEvent::KeyBorrowed { .. }))
    }

    fn has(&self, pred: impl Fn(&TreeEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}

impl<K: fmt::Display> fmt::Display for Operation<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(key) = &self.key else {
            return f.write_str("Tree has been reset.");
        };

        match self.kind {
            OperationKind::Reset => f.write_str("Tree has been reset."),
            OperationKind::Insert => {
                if self.has(|e| matches!(e, TreeEvent::RootCreated { .. })) {
                    return write!(f, "Inserted key {key} as root node.");
                }
                if self.has(|e| matches!(e, TreeEvent::RootSplit { .. })) {
                    write!(f, "Root split occurred while inserting key {key}")?;
                    let others = self.splits() - 1;
                    if others > 0 {
                        write!(f, " ({others} further node split(s))")?;
                    }
                    return f.write_str(".");
                }
                match self.splits() {
                    0 => write!(f, "Inserted key {key} into a leaf."),
                    n => write!(f, "Inserted key {key} after splitting {n} node(s)."),
                }
            }
            OperationKind::Delete => {
                write!(f, "Deleted key {key}")?;
                let mut notes: Vec<(usize, &str)> = Vec::new();
                if let Some(source) = self.events.iter().find_map(|e| match e {
                    TreeEvent::KeyReplaced { source, .. } => Some(*source),
                    _ => None,
                }) {
                    notes.push((
                        1,
                        match source {
                            Replacement::Predecessor => "replaced by its predecessor",
                            Replacement::Successor => "replaced by its successor",
                        },
                    ));
                }
                let borrows = self.borrows();
                if borrows > 0 {
                    notes.push((borrows, "sibling borrow(s)"));
                }
                let merges = self.merges();
                if merges > 0 {
                    notes.push((merges, "node merge(s)"));
                }
                if self.has(|e| matches!(e, TreeEvent::RootCollapsed { .. })) {
                    notes.push((1, "tree height shrank by one"));
                }
                if self.has(|e| matches!(e, TreeEvent::TreeEmptied)) {
                    notes.push((1, "tree is now empty"));
                }

                for (i, (n, note)) in notes.iter().enumerate() {
                    f.write_str(if i == 0 { ": " } else { ", " })?;
                    if note.ends_with("(s)") {
                        write!(f, "{n} {note}")?;
                    } else {
                        f.write_str(note)?;
                    }
                }
                f.write_str(".")
            }
        }
    }
}

/// Receives structural events and completion notices from a tree.
///
/// Both methods are called synchronously from inside the mutating call; the tree is
/// only guaranteed to be consistent when [`on_operation`](TreeObserver::on_operation)
/// runs.
pub trait TreeObserver<K> {
    /// Called for every structural step.
    fn on_event(&mut self, event: &TreeEvent);

    /// Called once a mutation has completed.
    fn on_operation(&mut self, operation: &Operation<K>) {
        let _ = operation;
    }
}

impl<K, F> TreeObserver<K> for F
where
    F: FnMut(&TreeEvent),
{
    fn on_event(&mut self, event: &TreeEvent) {
        self(event);
    }
}
