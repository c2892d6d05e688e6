//! An arena-backed B-tree catalog index for Rust.
//!
//! This crate provides [`CatalogTree`], an ordered map from keys to records built as a
//! classic B-tree of minimum degree `t`, with textbook top-down rebalancing on delete:
//!
//! - Insert splits full nodes on the way down, growing the tree at the root.
//! - Delete replaces internal keys by their predecessor or successor, tops up minimal
//!   nodes by borrowing from a sibling or merging with one, and shrinks the tree when
//!   the root runs out of keys.
//! - Every structural step is reported as a [`TreeEvent`], and [`CatalogTree::snapshot`]
//!   copies out the whole shape for rendering.
//!
//! # Example
//!
//! ```
//! use catalog_btree::{Library, TreeEvent, sample_books};
//!
//! let mut library = Library::with_min_degree(2).unwrap();
//! library.add_books(sample_books()).unwrap();
//!
//! let view = library.snapshot();
//! assert_eq!(view.height(), 2);
//! assert_eq!(view.root_node().unwrap().keys, vec![50]);
//!
//! // Search reports the path from the root for highlighting.
//! let hit = library.search(&35).unwrap();
//! assert_eq!(hit.record.title, "Operating Systems");
//! assert_eq!(hit.path.len(), 2);
//!
//! // Deleting the root's key pulls its predecessor up from the left leaf.
//! library.delete(&50).unwrap();
//! let op = library.last_operation().unwrap();
//! assert!(op.events.iter().any(|e| matches!(e, TreeEvent::KeyReplaced { .. })));
//! assert_eq!(library.snapshot().root_node().unwrap().keys, vec![35]);
//! library.check_invariants().unwrap();
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Single-pass mutations** - Insert and delete each walk one root-to-leaf path
//! - **Arena storage** - Nodes live in a slot arena addressed by compact handles
//! - **Observable** - Structural events go to an optional [`TreeObserver`] and to `tracing`
//!
//! # Implementation
//!
//! Keys live in every node next to a handle for their record. Records themselves are
//! stored once, in a separate arena owned by the catalog, which also keeps a sorted
//! key index for membership checks. The catalog is consulted before any mutation, so
//! rejected inserts and deletes never touch the tree.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod catalog;
mod raw;

pub mod book;
pub mod catalog_tree;
pub mod config;
pub mod error;
pub mod event;
pub mod view;

pub use book::{Book, BookId, Library, sample_books};
pub use catalog_tree::{CatalogTree, SearchHit, SearchTrace};
pub use config::{DEFAULT_MIN_DEGREE, MAX_MIN_DEGREE, TreeConfig};
pub use error::{ConfigError, DuplicateKeyError, InvariantViolation, KeyNotFoundError};
pub use event::{Operation, OperationKind, Replacement, Side, TreeEvent, TreeObserver};
pub use view::{NodeId, NodeView, TreeView};
