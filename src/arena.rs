//! Arena allocator: every acquire constructs, every release destroys.
//!
//! Storage is a `SlotMap`, so ids are generational and a released id never
//! resolves again. Released storage is not linked anywhere, so parking keeps
//! its own bounded vector of ids instead of splicing links.

use crate::alloc::{AllocatorStats, Element, ElementAllocator, NodeStore, ParkingStack};
use crate::reentrancy::ParkingLatch;
use slotmap::{DefaultKey, SlotMap};

/// Generational element id issued by an [`ArenaAllocator`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArenaId(DefaultKey);

pub struct ArenaAllocator<K, V> {
    slots: SlotMap<DefaultKey, Element<K, V, ArenaId>>,
    latch: ParkingLatch,
}

impl<K, V> Default for ArenaAllocator<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ArenaAllocator<K, V> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            latch: ParkingLatch::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            latch: ParkingLatch::new(),
        }
    }

    /// Whether `id` still refers to a live element.
    pub fn contains(&self, id: ArenaId) -> bool {
        self.slots.contains_key(id.0)
    }

    fn destroy(&mut self, id: ArenaId) -> (K, V) {
        match self.slots.remove(id.0) {
            Some(element) => (element.key, element.value),
            None => panic!("release of {id:?}, which is not live"),
        }
    }
}

impl<K, V> NodeStore for ArenaAllocator<K, V> {
    type Key = K;
    type Value = V;
    type Id = ArenaId;

    #[inline]
    fn node(&self, id: ArenaId) -> &Element<K, V, ArenaId> {
        match self.slots.get(id.0) {
            Some(element) => element,
            None => panic!("{id:?} is not live"),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: ArenaId) -> &mut Element<K, V, ArenaId> {
        match self.slots.get_mut(id.0) {
            Some(element) => element,
            None => panic!("{id:?} is not live"),
        }
    }
}

impl<K, V> ElementAllocator for ArenaAllocator<K, V> {
    type Parking<'a>
        = ArenaParking<'a, K, V>
    where
        Self: 'a;

    // SlotMap growth aborts the process when the global allocator fails.
    fn acquire(&mut self, key: K, value: V) -> ArenaId {
        self.latch.assert_idle("acquire");
        ArenaId(self.slots.insert(Element::new(key, value)))
    }

    fn release(&mut self, id: ArenaId) -> (K, V) {
        self.latch.assert_idle("release");
        self.destroy(id)
    }

    fn stats(&self) -> AllocatorStats {
        let size = core::mem::size_of::<Element<K, V, ArenaId>>();
        AllocatorStats {
            used: self.slots.len() * size,
            reserved: self.slots.capacity() * size,
        }
    }

    fn live(&self) -> usize {
        self.slots.len()
    }

    fn open_parking(&mut self, max_len: usize) -> ArenaParking<'_, K, V> {
        self.latch.engage();
        log::trace!("arena allocator: parking stack opened (max {max_len})");
        ArenaParking {
            alloc: self,
            parked: Vec::with_capacity(max_len),
            max_len,
        }
    }
}

/// Parking stack backed by a bounded vector of ids.
pub struct ArenaParking<'a, K, V> {
    alloc: &'a mut ArenaAllocator<K, V>,
    parked: Vec<ArenaId>,
    max_len: usize,
}

impl<K, V> NodeStore for ArenaParking<'_, K, V> {
    type Key = K;
    type Value = V;
    type Id = ArenaId;

    #[inline]
    fn node(&self, id: ArenaId) -> &Element<K, V, ArenaId> {
        self.alloc.node(id)
    }

    #[inline]
    fn node_mut(&mut self, id: ArenaId) -> &mut Element<K, V, ArenaId> {
        self.alloc.node_mut(id)
    }
}

impl<K, V> ParkingStack for ArenaParking<'_, K, V> {
    fn push(&mut self, id: ArenaId) {
        assert!(
            self.parked.len() < self.max_len,
            "parking stack overflow: max_len is {}",
            self.max_len
        );
        debug_assert!(self.alloc.contains(id), "{id:?} is not live");
        self.parked.push(id);
    }

    fn pop(&mut self) -> Option<ArenaId> {
        self.parked.pop()
    }

    fn len(&self) -> usize {
        self.parked.len()
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}

impl<K, V> Drop for ArenaParking<'_, K, V> {
    fn drop(&mut self) {
        if !self.parked.is_empty() {
            log::warn!(
                "arena allocator: releasing {} elements left on parking stack",
                self.parked.len()
            );
        }
        while let Some(id) = self.parked.pop() {
            drop(self.alloc.destroy(id));
        }
        self.alloc.latch.disengage();
        log::trace!("arena allocator: parking stack closed");
    }
}
