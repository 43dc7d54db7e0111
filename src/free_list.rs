//! Free-list allocator: released elements are recycled, not destroyed.
//!
//! Elements live in one growable slot vector. A released slot becomes a free
//! slot whose only content is the link to the next free slot, so the free list
//! needs no storage of its own. Parking uses the same splicing: parked
//! elements are chained through their own `next` link.

use crate::alloc::{AllocatorStats, Element, ElementAllocator, NodeStore, ParkingStack};
use crate::reentrancy::ParkingLatch;
use std::alloc::{handle_alloc_error, Layout};

/// Index of a slot in a [`FreeListAllocator`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index; stable while the element is live.
    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
enum Slot<K, V> {
    Live(Element<K, V, SlotId>),
    Free { next: Option<SlotId> },
}

#[derive(Debug)]
pub struct FreeListAllocator<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Option<SlotId>,
    free_len: usize,
    live: usize,
    latch: ParkingLatch,
}

impl<K, V> Default for FreeListAllocator<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FreeListAllocator<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            free_len: 0,
            live: 0,
            latch: ParkingLatch::new(),
        }
    }

    /// Reserve storage for `capacity` elements up front.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut this = Self::new();
        this.slots.reserve(capacity);
        this
    }

    /// Number of recycled slots waiting for reuse.
    pub fn free_len(&self) -> usize {
        self.free_len
    }

    fn push_slot(&mut self, element: Element<K, V, SlotId>) -> SlotId {
        let index = self.slots.len();
        assert!(index < u32::MAX as usize, "free-list allocator is full");
        if self.slots.try_reserve(1).is_err() {
            log::error!("free-list allocator: out of memory growing to {} slots", index + 1);
            handle_alloc_error(Layout::new::<Slot<K, V>>());
        }
        self.slots.push(Slot::Live(element));
        SlotId(index as u32)
    }

    /// Move a live element onto the free list and hand back its contents.
    fn recycle(&mut self, id: SlotId) -> (K, V) {
        let slot = &mut self.slots[id.index()];
        assert!(
            matches!(slot, Slot::Live(_)),
            "release of {id:?}, which is not live"
        );
        let Slot::Live(element) = std::mem::replace(slot, Slot::Free { next: self.free }) else {
            unreachable!()
        };
        self.free = Some(id);
        self.free_len += 1;
        self.live -= 1;
        (element.key, element.value)
    }
}

impl<K, V> NodeStore for FreeListAllocator<K, V> {
    type Key = K;
    type Value = V;
    type Id = SlotId;

    #[inline]
    fn node(&self, id: SlotId) -> &Element<K, V, SlotId> {
        match &self.slots[id.index()] {
            Slot::Live(element) => element,
            Slot::Free { .. } => panic!("{id:?} refers to a free slot"),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: SlotId) -> &mut Element<K, V, SlotId> {
        match &mut self.slots[id.index()] {
            Slot::Live(element) => element,
            Slot::Free { .. } => panic!("{id:?} refers to a free slot"),
        }
    }
}

impl<K, V> ElementAllocator for FreeListAllocator<K, V> {
    type Parking<'a>
        = FreeListParking<'a, K, V>
    where
        Self: 'a;

    fn acquire(&mut self, key: K, value: V) -> SlotId {
        self.latch.assert_idle("acquire");
        let element = Element::new(key, value);
        let id = match self.free {
            Some(id) => {
                let slot = &mut self.slots[id.index()];
                let Slot::Free { next } = *slot else {
                    unreachable!("free list head {id:?} is live")
                };
                *slot = Slot::Live(element);
                self.free = next;
                self.free_len -= 1;
                id
            }
            None => self.push_slot(element),
        };
        self.live += 1;
        id
    }

    fn release(&mut self, id: SlotId) -> (K, V) {
        self.latch.assert_idle("release");
        self.recycle(id)
    }

    fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            used: self.live * core::mem::size_of::<Element<K, V, SlotId>>(),
            reserved: self.slots.capacity() * core::mem::size_of::<Slot<K, V>>(),
        }
    }

    fn live(&self) -> usize {
        self.live
    }

    fn open_parking(&mut self, max_len: usize) -> FreeListParking<'_, K, V> {
        self.latch.engage();
        log::trace!("free-list allocator: parking stack opened (max {max_len})");
        FreeListParking {
            alloc: self,
            head: None,
            len: 0,
            max_len,
        }
    }
}

/// Parking stack spliced through the parked elements' own links.
pub struct FreeListParking<'a, K, V> {
    alloc: &'a mut FreeListAllocator<K, V>,
    head: Option<SlotId>,
    len: usize,
    max_len: usize,
}

impl<K, V> NodeStore for FreeListParking<'_, K, V> {
    type Key = K;
    type Value = V;
    type Id = SlotId;

    #[inline]
    fn node(&self, id: SlotId) -> &Element<K, V, SlotId> {
        self.alloc.node(id)
    }

    #[inline]
    fn node_mut(&mut self, id: SlotId) -> &mut Element<K, V, SlotId> {
        self.alloc.node_mut(id)
    }
}

impl<K, V> ParkingStack for FreeListParking<'_, K, V> {
    fn push(&mut self, id: SlotId) {
        assert!(
            self.len < self.max_len,
            "parking stack overflow: max_len is {}",
            self.max_len
        );
        let head = self.head;
        let node = self.alloc.node_mut(id);
        debug_assert!(node.next.is_none(), "{id:?} is still linked into a chain");
        node.next = head;
        self.head = Some(id);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<SlotId> {
        let id = self.head?;
        self.head = self.alloc.node_mut(id).next.take();
        self.len -= 1;
        Some(id)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}

impl<K, V> Drop for FreeListParking<'_, K, V> {
    fn drop(&mut self) {
        if self.len > 0 {
            log::warn!(
                "free-list allocator: releasing {} elements left on parking stack",
                self.len
            );
        }
        while let Some(id) = self.pop() {
            drop(self.alloc.recycle(id));
        }
        self.alloc.latch.disengage();
        log::trace!("free-list allocator: parking stack closed");
    }
}
