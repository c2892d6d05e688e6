use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage for nodes and records, addressed by [`Handle`].
///
/// Freed slots go onto a free list and are handed out again by the next `alloc`, so
/// a structure that merges and splits repeatedly does not grow without bound.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            // Strict less-than keeps the live element count within `Handle::MAX`.
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.slots.get(handle.to_index()).is_some_and(Option::is_some)
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn freed_slot_is_reused() {
        let mut arena: Arena<&str> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        arena.free(a);
        assert!(!arena.contains(a));
        assert!(arena.contains(b));

        let c = arena.alloc("c");
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), "c");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    #[should_panic(expected = "`Arena::get()` - `handle` is invalid!")]
    fn get_after_take_panics() {
        let mut arena: Arena<u32> = Arena::new();
        let h = arena.alloc(7);
        assert_eq!(arena.take(h), 7);
        let _ = arena.get(h);
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value);
                        model.push((handle, value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        *arena.get_mut(handle) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let value1 = arena.take(handle);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, value2);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert!(arena.contains(handle));
                    prop_assert_eq!(*arena.get(handle), value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            5 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
