//! ChainedMap: key/value facade over `RawTable`.

use crate::alloc::{AllocatorStats, ElementAllocator};
use crate::config::{ConfigError, TableConfig};
use crate::free_list::FreeListAllocator;
use crate::hash::KeyHash;
use crate::raw_table::{Inconsistency, InsertError, Iter, RawTable};
use core::borrow::Borrow;
use core::fmt;

/// Hash map with chained buckets and a pluggable element allocator.
///
/// ```
/// use chained_hashmap::ChainedMap;
///
/// let mut m = ChainedMap::new();
/// m.put("a".to_string(), 1);
/// assert_eq!(m.get("a"), Some(&1));
/// assert_eq!(m.remove("a"), Some(1));
/// assert_eq!(m.get("a"), None);
/// ```
pub struct ChainedMap<K, V, A = FreeListAllocator<K, V>>
where
    A: ElementAllocator<Key = K, Value = V>,
{
    table: RawTable<K, V, A>,
}

impl<K, V> ChainedMap<K, V>
where
    K: Eq + KeyHash,
{
    pub fn new() -> Self {
        Self {
            table: RawTable::from_parts(TableConfig::default(), FreeListAllocator::new()),
        }
    }

    /// Map sized for `n` elements at the default load factor.
    ///
    /// Panics if `n` needs more than [`MAX_BUCKETS`](crate::config::MAX_BUCKETS)
    /// buckets.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            table: RawTable::from_parts(TableConfig::new().expected_len(n), FreeListAllocator::new()),
        }
    }

    /// Map sized for `n` elements at `load_factor`.
    pub fn with_load_factor(n: usize, load_factor: f64) -> Result<Self, ConfigError> {
        Self::with_config(TableConfig::new().expected_len(n).load_factor(load_factor))
    }
}

impl<K, V> Default for ChainedMap<K, V>
where
    K: Eq + KeyHash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A> ChainedMap<K, V, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = V> + Default,
{
    /// Sized by `config`, which is validated first.
    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            table: RawTable::with_config(config)?,
        })
    }
}

impl<K, V, A> ChainedMap<K, V, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = V>,
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

    /// Mean elements per bucket.
    #[inline]
    pub fn load(&self) -> f64 {
        self.table.load()
    }

    /// Longest chain.
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

    /// Insert or overwrite; returns the previous value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Value for `key`, inserting `make_value()` first if absent.
    pub fn put_with<F>(&mut self, key: K, make_value: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = self.table.put_with(key, make_value).id();
        self.table.value_mut(id)
    }

    /// Insert only if `key` is absent.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<&mut V, InsertError> {
        let id = self.table.try_insert(key, value)?;
        Ok(self.table.value_mut(id))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.get(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.get_mut(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.find(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.remove(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + KeyHash + Eq,
    {
        self.table.remove(q)
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    /// Rebuild with `bucket_count` buckets.
    pub fn resize(&mut self, bucket_count: usize) {
        self.table.resize(bucket_count)
    }

    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit()
    }

    pub fn iter(&self) -> Iter<'_, K, V, A> {
        self.table.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.table.iter().map(|(_, v)| v)
    }

    pub fn check_consistency(&self) -> Result<(), Inconsistency> {
        self.table.check_consistency()
    }
}

impl<K, V, A> fmt::Debug for ChainedMap<K, V, A>
where
    K: Eq + KeyHash + fmt::Debug,
    V: fmt::Debug,
    A: ElementAllocator<Key = K, Value = V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<'a, K, V, A> IntoIterator for &'a ChainedMap<K, V, A>
where
    K: Eq + KeyHash,
    A: ElementAllocator<Key = K, Value = V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for ChainedMap<K, V>
where
    K: Eq + KeyHash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            map.put(k, v);
        }
        map
    }
}
