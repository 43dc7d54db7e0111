//! chained-hashmap: a single-threaded hash table with separate chaining,
//! per-bucket load accounting and a pluggable element allocator.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build the table from small parts with one contract each, so that
//!   the resize path can be reasoned about without the rest.
//! - Layers:
//!   - `hash`: FNV-1a (32 and 64 bit) and the `KeyHash` trait every key
//!     implements. `HashValue` keys are their own hash.
//!   - `alloc`: the `ElementAllocator` capability. An allocator owns every
//!     element; chains only hold ids. Two strategies ship with the crate:
//!     `FreeListAllocator` recycles released slots, `ArenaAllocator` destroys
//!     them immediately.
//!   - `bucket`: one singly-linked chain; find, add, link, remove.
//!   - `load`: `LoadAccountant`, an O(1) count of elements per bucket kept in
//!     a compacted record list so that only non-empty buckets are visited.
//!   - `raw_table`: bucket array, accountant and allocator kept in step,
//!     plus the growth policy and the resize protocol.
//!   - `map` / `set`: `ChainedMap` and `ChainedSet`, thin facades over
//!     `RawTable`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` through the reentrancy marker.
//! - Element ids are stable for the element's lifetime, across resizes.
//! - Unique keys; `try_insert` reports duplicates, `put` overwrites.
//! - Reentrancy: a key's `Eq` runs while a chain is walked. Entering the
//!   same table from there panics in debug builds.
//!
//! Resize protocol
//! - Every element is moved off its chain onto the allocator's parking
//!   stack, the bucket array and accountant are rebuilt at the new size,
//!   then each element is popped and linked at its new index.
//! - A parking stack mutably borrows its allocator: only one can be open,
//!   and nothing can be acquired or released while it is. It is closed by
//!   `Drop`, which releases anything still parked, unwinding included.
//! - Parking never allocates for the free-list strategy; parked elements
//!   chain through their own links.
//!
//! Growth policy
//! - After an insert that pushes `len / bucket_count` above the load factor
//!   the table resizes to twice the length over the load factor. Removal
//!   never shrinks; call `shrink_to_fit`.

pub mod alloc;
pub mod arena;
pub mod bucket;
pub mod config;
pub mod free_list;
pub mod hash;
pub mod load;
mod map;
pub mod raw_table;
mod raw_table_proptest;
mod reentrancy;
mod set;

// Public surface
pub use alloc::{AllocatorStats, Element, ElementAllocator, NodeStore, ParkingStack};
pub use arena::{ArenaAllocator, ArenaId};
pub use bucket::{Added, Bucket};
pub use config::{ConfigError, TableConfig, DEFAULT_LOAD_FACTOR};
pub use free_list::{FreeListAllocator, SlotId};
pub use hash::{fnv1a_32, fnv1a_64, ByHash, FnvBuildHasher, FnvHasher, HashValue, KeyHash};
pub use load::{LoadAccountant, LoadRecord};
pub use map::ChainedMap;
pub use raw_table::{Inconsistency, InsertError, RawTable};
pub use reentrancy::{DebugReentrancy, ParkingLatch};
pub use set::ChainedSet;
