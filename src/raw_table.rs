//! RawTable: bucket array, load accountant and allocator kept in step.
//!
//! Every mutation touches all three: the bucket chain is edited, the element
//! is acquired from or released to the allocator, and the accountant's count
//! for that bucket index is adjusted. Element ids are stable across resizes;
//! a resize parks every element and relinks it, it never copies one.

use crate::alloc::{AllocatorStats, ElementAllocator, NodeStore, ParkingStack};
use crate::bucket::{Added, Bucket};
use crate::config::{buckets_for, ConfigError, TableConfig, MAX_BUCKETS};
use crate::free_list::FreeListAllocator;
use crate::hash::KeyHash;
use crate::load::LoadAccountant;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use hashbrown::HashSet;

#[derive(Debug)]
pub enum InsertError {
    DuplicateKey,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("key already present"),
        }
    }
}

impl std::error::Error for InsertError {}

/// A broken table invariant found by [`RawTable::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The accountant's own invariants do not hold.
    Accounting,
    /// The chain of `bucket` loops back on itself.
    ChainCycle { bucket: usize },
    /// The accountant's count for `bucket` differs from its chain length.
    BucketLength {
        bucket: usize,
        counted: usize,
        recorded: usize,
    },
    /// An element in `bucket` hashes to a different bucket.
    Misplaced { bucket: usize },
    /// An element in `bucket` is also reachable from an earlier bucket.
    SharedElement { bucket: usize },
    /// The allocator holds a different number of elements than the table.
    LiveCount { live: usize, len: usize },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::Accounting => f.write_str("load accountant invariants violated"),
            Inconsistency::ChainCycle { bucket } => write!(f, "cycle in chain of bucket {bucket}"),
            Inconsistency::BucketLength {
                bucket,
                counted,
                recorded,
            } => write!(
                f,
                "bucket {bucket} holds {counted} elements but {recorded} are recorded"
            ),
            Inconsistency::Misplaced { bucket } => {
                write!(f, "element in bucket {bucket} belongs to another bucket")
            }
            Inconsistency::SharedElement { bucket } => {
                write!(f, "element in bucket {bucket} is reachable from two chains")
            }
            Inconsistency::LiveCount { live, len } => {
                write!(f, "allocator holds {live} elements, table counts {len}")
            }
        }
    }
}

impl std::error::Error for Inconsistency {}

#[inline]
fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

pub struct RawTable<K, V, A = FreeListAllocator<K, V>>
where
    A: ElementAllocator<Key = K, Value = V>,
{
    buckets: Vec<Bucket<A::Id>>,
    load: LoadAccountant,
    alloc: A,
    load_factor: f64,
    reentrancy: DebugReentrancy,
}

impl<K, V, A> RawTable<K, V, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = V> + Default,
{
    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_allocator(config, A::default())
    }
}

impl<K, V, A> RawTable<K, V, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = V>,
{
    /// Table sized by `config`, storing elements in `alloc`.
    ///
    /// `config` is validated with [`TableConfig::build`]. `alloc` must not
    /// hold any elements yet.
    pub fn with_allocator(config: TableConfig, alloc: A) -> Result<Self, ConfigError> {
        let config = config.build()?;
        Ok(Self::from_parts(config, alloc))
    }

    /// Unchecked construction for configs known to be valid.
    pub(crate) fn from_parts(config: TableConfig, alloc: A) -> Self {
        assert_eq!(alloc.live(), 0, "allocator already holds elements");
        let bucket_count = config.bucket_count();
        Self {
            buckets: vec![Bucket::new(); bucket_count],
            load: LoadAccountant::new(bucket_count),
            alloc,
            load_factor: config.get_load_factor(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.load.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.load.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    #[inline]
    pub fn load(&self) -> f64 {
        self.load.load()
    }

    #[inline]
    pub fn max_load(&self) -> usize {
        self.load.max_load()
    }

    #[inline]
    pub fn accountant(&self) -> &LoadAccountant {
        &self.load
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn stats(&self) -> AllocatorStats {
        self.alloc.stats()
    }

    #[inline]
    pub fn used_memory(&self) -> usize {
        self.alloc.used_memory()
    }

    #[inline]
    fn index_for<Q: ?Sized + KeyHash>(&self, q: &Q) -> usize {
        bucket_index(q.to_hash(), self.buckets.len())
    }

    pub fn find<Q>(&self, q: &Q) -> Option<A::Id>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        let index = self.index_for(q);
        self.buckets[index].find(&self.alloc, q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        let id = self.find(q)?;
        let node = self.alloc.node(id);
        Some((&node.key, &node.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        let id = self.find(q)?;
        Some(&mut self.alloc.node_mut(id).value)
    }

    /// Key and value of a live element.
    #[inline]
    pub fn entry(&self, id: A::Id) -> (&K, &V) {
        let node = self.alloc.node(id);
        (&node.key, &node.value)
    }

    #[inline]
    pub fn value_mut(&mut self, id: A::Id) -> &mut V {
        &mut self.alloc.node_mut(id).value
    }

    /// Element for `key`, creating it with `make_value` if absent.
    ///
    /// `make_value` is not called when the key is present. May grow the
    /// table; the returned id stays valid across the resize.
    pub fn put_with<F>(&mut self, key: K, make_value: F) -> Added<A::Id>
    where
        F: FnOnce() -> V,
    {
        let added = {
            let _g = self.reentrancy.enter("put_with");
            let index = self.index_for(&key);
            let added = self.buckets[index].add_with(&mut self.alloc, key, make_value);
            if added.is_created() {
                self.load.put(index);
            }
            added
        };
        if added.is_created() {
            self.grow_if_needed();
        }
        added
    }

    /// Insert or overwrite; returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        {
            let _g = self.reentrancy.enter("insert");
            let index = self.index_for(&key);
            if let Some(id) = self.buckets[index].find(&self.alloc, &key) {
                return Some(core::mem::replace(
                    &mut self.alloc.node_mut(id).value,
                    value,
                ));
            }
            let id = self.alloc.acquire(key, value);
            self.buckets[index].link(&mut self.alloc, id);
            self.load.put(index);
        }
        self.grow_if_needed();
        None
    }

    /// Insert only if absent.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<A::Id, InsertError> {
        let id = {
            let _g = self.reentrancy.enter("try_insert");
            let index = self.index_for(&key);
            if self.buckets[index].find(&self.alloc, &key).is_some() {
                return Err(InsertError::DuplicateKey);
            }
            let id = self.alloc.acquire(key, value);
            self.buckets[index].link(&mut self.alloc, id);
            self.load.put(index);
            id
        };
        self.grow_if_needed();
        Ok(id)
    }

    /// Unlink and release the element matching `q`.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        let _g = self.reentrancy.enter("remove");
        let index = self.index_for(q);
        let id = self.buckets[index].remove(&mut self.alloc, q)?;
        self.load.remove(index);
        Some(self.alloc.release(id))
    }

    /// Release every element; the bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        for record in self.load.records() {
            let bucket = &mut self.buckets[record.index];
            while let Some(id) = bucket.take_first(&mut self.alloc) {
                drop(self.alloc.release(id));
            }
        }
        self.load.clear();
    }

    fn grow_if_needed(&mut self) {
        if self.load.load() > self.load_factor {
            let target = buckets_for(self.len().saturating_mul(2), self.load_factor);
            self.resize(target.min(MAX_BUCKETS));
        }
    }

    /// Shrink (or grow) to the smallest bucket count within the load factor.
    pub fn shrink_to_fit(&mut self) {
        let target = buckets_for(self.len(), self.load_factor);
        if target != self.bucket_count() {
            self.resize(target);
        }
    }

    /// Rebuild the table with `bucket_count` buckets.
    ///
    /// Every element is parked, the bucket array and accountant are rebuilt at
    /// the new size, and each parked element is relinked at its new index.
    pub fn resize(&mut self, bucket_count: usize) {
        assert!(bucket_count > 0, "bucket count must be positive");
        let _g = self.reentrancy.enter("resize");
        let len = self.load.len();
        log::debug!(
            "resizing table from {} to {} buckets ({} elements)",
            self.buckets.len(),
            bucket_count,
            len
        );
        let buckets = &mut self.buckets;
        let load = &mut self.load;
        self.alloc.park(len, |stack| {
            for record in load.records() {
                let bucket = &mut buckets[record.index];
                while let Some(id) = bucket.take_first(stack) {
                    stack.push(id);
                }
            }
            load.clear_and_resize(bucket_count);
            buckets.clear();
            buckets.resize(bucket_count, Bucket::new());
            while let Some(id) = stack.pop() {
                let index = bucket_index(stack.node(id).key.to_hash(), bucket_count);
                buckets[index].link(stack, id);
                load.put(index);
            }
        });
        debug_assert_eq!(self.load.len(), len);
    }

    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter {
            table: self,
            record: 0,
            cur: None,
        }
    }

    /// Verify every structural invariant by walking all chains.
    pub fn check_consistency(&self) -> Result<(), Inconsistency> {
        if !self.load.is_consistent() || self.load.bucket_count() != self.buckets.len() {
            return Err(Inconsistency::Accounting);
        }
        let mut seen: HashSet<A::Id> = HashSet::with_capacity(self.len());
        let mut total = 0;
        for (index, bucket) in self.buckets.iter().enumerate() {
            if !bucket.is_acyclic(&self.alloc) {
                return Err(Inconsistency::ChainCycle { bucket: index });
            }
            let mut counted = 0;
            for id in bucket.iter(&self.alloc) {
                if !seen.insert(id) {
                    return Err(Inconsistency::SharedElement { bucket: index });
                }
                let key = &self.alloc.node(id).key;
                if bucket_index(key.to_hash(), self.buckets.len()) != index {
                    return Err(Inconsistency::Misplaced { bucket: index });
                }
                counted += 1;
            }
            let recorded = self.load[index];
            if counted != recorded {
                return Err(Inconsistency::BucketLength {
                    bucket: index,
                    counted,
                    recorded,
                });
            }
            total += counted;
        }
        if self.alloc.live() != total {
            return Err(Inconsistency::LiveCount {
                live: self.alloc.live(),
                len: total,
            });
        }
        Ok(())
    }
}

impl<K, V, A> fmt::Debug for RawTable<K, V, A>
where
    K: Eq + KeyHash + fmt::Debug,
    V: fmt::Debug,
    A: ElementAllocator<Key = K, Value = V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(key, value)` pairs, visiting only non-empty buckets.
pub struct Iter<'a, K, V, A>
where
    A: ElementAllocator<Key = K, Value = V>,
{
    table: &'a RawTable<K, V, A>,
    record: usize,
    cur: Option<A::Id>,
}

impl<'a, K, V, A> Iterator for Iter<'a, K, V, A>
where
    A: ElementAllocator<Key = K, Value = V>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        loop {
            if let Some(id) = self.cur {
                let node = table.alloc.node(id);
                self.cur = node.next();
                return Some((&node.key, &node.value));
            }
            let record = table.load.records().get(self.record)?;
            self.record += 1;
            self.cur = table.buckets[record.index].first();
        }
    }
}
