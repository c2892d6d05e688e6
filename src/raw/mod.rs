mod arena;
mod handle;
mod node;
mod raw_btree;
mod store;

pub(crate) use arena::Arena;
pub(crate) use handle::Handle;
pub(crate) use raw_btree::{RawBTree, Trace};
