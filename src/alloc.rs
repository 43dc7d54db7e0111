//! Element allocation capability shared by the table's storage strategies.
//!
//! An allocator owns every element: live ones (installed in a bucket chain),
//! free ones (recycled, if the strategy recycles) and parked ones (moved out of
//! their chain during a resize). Chains only hold ids, and walk them through
//! [`NodeStore`].

use core::fmt::Debug;
use core::hash::Hash;
use core::ops;

/// One chain node: key, value and the link to the next node in the same bucket.
#[derive(Debug)]
pub struct Element<K, V, I> {
    pub key: K,
    pub value: V,
    pub(crate) next: Option<I>,
}

impl<K, V, I> Element<K, V, I> {
    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            next: None,
        }
    }

    /// Link to the next node, if any.
    pub fn next(&self) -> Option<I>
    where
        I: Copy,
    {
        self.next
    }
}

/// Id-addressed access to elements.
pub trait NodeStore {
    type Key;
    type Value;
    /// Stable element address. Stays valid until the element is released.
    type Id: Copy + Eq + Hash + Debug;

    /// Panics if `id` does not refer to a live element.
    fn node(&self, id: Self::Id) -> &Element<Self::Key, Self::Value, Self::Id>;

    /// Panics if `id` does not refer to a live element.
    fn node_mut(&mut self, id: Self::Id) -> &mut Element<Self::Key, Self::Value, Self::Id>;
}


/// Memory accounting for an allocator, in bytes.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq)]
pub struct AllocatorStats {
    /// Bytes held by acquired (live or parked) elements.
    pub used: usize,
    /// Bytes of backing storage, including free slots.
    pub reserved: usize,
}

impl ops::Add for AllocatorStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            used: self.used + rhs.used,
            reserved: self.reserved + rhs.reserved,
        }
    }
}

/// Construction, destruction and parking of elements.
///
/// While a parking stack is open the allocator is mutably borrowed by it, so
/// no other stack can be opened and no element can be acquired or released.
/// Implementations also keep a runtime latch so that a stack which was leaked
/// instead of dropped leaves the allocator unusable rather than inconsistent.
pub trait ElementAllocator: NodeStore {
    /// Parking stack bound to one exclusive borrow of the allocator.
    type Parking<'a>: ParkingStack<Key = Self::Key, Value = Self::Value, Id = Self::Id>
    where
        Self: 'a;

    /// Construct an element holding `key` and `value`, unlinked.
    fn acquire(&mut self, key: Self::Key, value: Self::Value) -> Self::Id;

    /// Destroy (or recycle) an element that is no longer in any chain.
    fn release(&mut self, id: Self::Id) -> (Self::Key, Self::Value);

    fn stats(&self) -> AllocatorStats;

    /// Number of acquired elements, parked ones included.
    fn live(&self) -> usize;

    /// Open a parking stack holding at most `max_len` elements.
    ///
    /// Panics if a previously opened stack was never closed.
    fn open_parking(&mut self, max_len: usize) -> Self::Parking<'_>;

    #[inline]
    fn used_memory(&self) -> usize {
        self.stats().used
    }

    /// Run `f` with a parking stack of capacity `max_len`.
    ///
    /// Whatever `f` leaves on the stack is released when it returns, on
    /// every path including unwinding.
    fn park<'s, R, F>(&'s mut self, max_len: usize, f: F) -> R
    where
        F: FnOnce(&mut Self::Parking<'s>) -> R,
    {
        let mut stack = self.open_parking(max_len);
        f(&mut stack)
    }
}

/// Bounded LIFO of elements that are neither free nor installed in a chain.
pub trait ParkingStack: NodeStore {
    /// Park `id`. Panics when `max_len` elements are already parked.
    fn push(&mut self, id: Self::Id);

    /// Most recently parked element, or `None` once drained.
    fn pop(&mut self) -> Option<Self::Id>;

    fn len(&self) -> usize;

    fn max_len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
