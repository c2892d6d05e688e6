use alloc::collections::BTreeMap;

use crate::raw::{Arena, Handle};

/// Key → record mapping kept in lockstep with the tree.
///
/// Records are stored once, in an arena; the tree's nodes and the key index both refer
/// to them by [`Handle`]. The index answers membership questions without a traversal.
#[derive(Clone, Debug)]
pub(crate) struct Catalog<K, R> {
    records: Arena<R>,
    index: BTreeMap<K, Handle>,
}

impl<K: Ord, R> Catalog<K, R> {
    pub(crate) const fn new() -> Self {
        Self {
            records: Arena::new(),
            index: BTreeMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn handle_of(&self, key: &K) -> Option<Handle> {
        self.index.get(key).copied()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&R> {
        self.handle_of(key).map(|h| self.records.get(h))
    }

    pub(crate) fn record(&self, handle: Handle) -> &R {
        self.records.get(handle)
    }

    /// Stores a record under a key that must not already be present.
    pub(crate) fn insert(&mut self, key: K, record: R) -> Handle {
        let handle = self.records.alloc(record);
        let previous = self.index.insert(key, handle);
        debug_assert!(previous.is_none(), "catalog already held this key");
        handle
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<R> {
        let handle = self.index.remove(key)?;
        Some(self.records.take(handle))
    }

    /// Entries in key order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &R)> {
        self.index.iter().map(|(k, &h)| (k, self.records.get(h)))
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Number of stored records, indexed or not.
    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn lockstep_insert_and_remove() {
        let mut catalog: Catalog<u32, &str> = Catalog::new();
        let h = catalog.insert(50, "Data Structures and Algorithms");
        catalog.insert(25, "Introduction to Programming");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.handle_of(&50), Some(h));
        assert_eq!(catalog.get(&25), Some(&"Introduction to Programming"));
        assert_eq!(*catalog.record(h), "Data Structures and Algorithms");

        let keys: Vec<u32> = catalog.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [25, 50]);

        assert_eq!(catalog.remove(&50), Some("Data Structures and Algorithms"));
        assert_eq!(catalog.remove(&50), None);
        assert!(!catalog.contains_key(&50));
        assert_eq!(catalog.record_count(), 1);
    }

    #[test]
    fn clear_drops_records() {
        let mut catalog: Catalog<u32, u32> = Catalog::new();
        catalog.insert(1, 7);
        catalog.clear();
        assert!(catalog.is_empty());
        assert_eq!(catalog.record_count(), 0);
        assert_eq!(catalog.get(&1), None);
    }
}
