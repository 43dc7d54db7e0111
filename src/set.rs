//! ChainedSet: key-only facade over `RawTable` with a `()` value.

use crate::alloc::{AllocatorStats, ElementAllocator};
use crate::config::{ConfigError, TableConfig};
use crate::free_list::FreeListAllocator;
use crate::hash::KeyHash;
use crate::raw_table::{Inconsistency, RawTable};
use core::borrow::Borrow;
use core::fmt;

/// Hash set with chained buckets. Keys that already are hash values
/// ([`HashValue`](crate::HashValue)) are used as their own hash.
///
/// ```
/// use chained_hashmap::{ChainedSet, HashValue};
///
/// let mut s = ChainedSet::new();
/// assert!(s.put(HashValue(0xFEED)));
/// assert!(!s.put(HashValue(0xFEED)));
/// assert!(s.contains(&HashValue(0xFEED)));
/// ```
pub struct ChainedSet<K, A = FreeListAllocator<K, ()>>
where
    A: ElementAllocator<Key = K, Value = ()>,
{
    table: RawTable<K, (), A>,
}

impl<K> ChainedSet<K>
where
    K: Eq + KeyHash,
{
    pub fn new() -> Self {
        Self {
            table: RawTable::from_parts(TableConfig::default(), FreeListAllocator::new()),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            table: RawTable::from_parts(TableConfig::new().expected_len(n), FreeListAllocator::new()),
        }
    }

    pub fn with_load_factor(n: usize, load_factor: f64) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new().expected_len(n).load_factor(load_factor))
    }
}

impl<K> Default for ChainedSet<K>
where
    K: Eq + KeyHash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> ChainedSet<K, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = ()> + Default,
{
    /// Sized by `config`, which is validated first.
    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: RawTable::with_config(config)?,
        })
    }
}

impl<K, A> ChainedSet<K, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = ()>,
{
    pub fn with_allocator(config: TableConfig, alloc: A) -> Result<Self, ConfigError> {
        Ok(Self {
            table: RawTable::with_allocator(config, alloc)?,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    #[inline]
    pub fn load(&self) -> f64 {
        self.table.load()
    }

    #[inline]
    pub fn max_load(&self) -> usize {
        self.table.max_load()
    }

    #[inline]
    pub fn used_memory(&self) -> usize {
        self.table.used_memory()
    }

    #[inline]
    pub fn stats(&self) -> AllocatorStats {
        self.table.stats()
    }

    /// Add `key`; true if it was not present before.
    pub fn put(&mut self, key: K) -> bool {
        self.table.put_with(key, || ()).is_created()
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.find(q).is_some()
    }

    /// The stored key equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.get(q).map(|(k, _)| k)
    }

    /// Remove `q`; true if it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.remove(q).is_some()
    }

    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.remove(q).map(|(k, ())| k)
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn resize(&mut self, bucket_count: usize) {
        self.table.resize(bucket_count)
    }

    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.iter().map(|(k, _)| k)
    }

    pub fn check_consistency(&self) -> Result<(), Inconsistency> {
        self.table.check_consistency()
    }
}

impl<K, A> fmt::Debug for ChainedSet<K, A>
where
    K: Eq + KeyHash + fmt::Debug,
    A: ElementAllocator<Key = K, Value = ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K> FromIterator<K> for ChainedSet<K>
where
    K: Eq + KeyHash,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity(iter.size_hint().0);
        for k in iter {
            set.put(k);
        }
        set
    }
}
