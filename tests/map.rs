// ChainedMap integration suite.
//
// Core invariants exercised:
// - Round trip: put then get returns the value; remove then get misses.
// - Idempotent remove: a second remove of the same key reports not-found.
// - Growth: inserting past the load factor grows the table and keeps every
//   element reachable.
// - Resize: explicit resizes to any positive bucket count preserve contents.
// - Storage: the free-list strategy recycles released elements.
use chained_hashmap::{
    ArenaAllocator, ChainedMap, ConfigError, ElementAllocator, FreeListAllocator, HashValue,
    TableConfig,
};
use std::collections::BTreeMap;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test: basic round trip with owned string keys and borrowed lookups.
#[test]
fn put_get_remove_round_trip() {
    init_logging();
    let mut m = ChainedMap::new();
    assert_eq!(m.put("one".to_string(), 1), None);
    assert_eq!(m.put("two".to_string(), 2), None);
    assert_eq!(m.get("one"), Some(&1));
    assert!(m.contains_key("two"));
    assert_eq!(m.remove("one"), Some(1));
    assert_eq!(m.get("one"), None);
    assert_eq!(m.remove("one"), None);
    assert_eq!(m.len(), 1);
    m.check_consistency().unwrap();
}

// Test: growth from a single bucket.
// Verifies: after every insert load <= load factor; all keys retrievable.
#[test]
fn grows_from_one_bucket() {
    init_logging();
    let mut m: ChainedMap<u64, u64> = ChainedMap::with_capacity(0);
    assert_eq!(m.bucket_count(), 1);
    for k in 0..1_000u64 {
        m.put(k, k.wrapping_mul(31));
        assert!(m.load() <= 0.75, "load {} after {} inserts", m.load(), k + 1);
    }
    assert!(m.bucket_count() > 1_000);
    for k in 0..1_000u64 {
        assert_eq!(m.get(&k), Some(&k.wrapping_mul(31)));
    }
    m.check_consistency().unwrap();
}

// Test: removal does not shrink; shrink_to_fit does.
#[test]
fn removal_keeps_buckets_until_shrink() {
    let mut m: ChainedMap<u32, ()> = (0..200).map(|k| (k, ())).collect();
    let grown = m.bucket_count();
    for k in 0..190 {
        m.remove(&k);
    }
    assert_eq!(m.bucket_count(), grown);
    m.shrink_to_fit();
    assert_eq!(m.bucket_count(), 14);
    let mut rest: Vec<_> = m.keys().copied().collect();
    rest.sort();
    assert_eq!(rest, (190..200).collect::<Vec<_>>());
}

// Test: explicit resizes across sizes, compared against an ordered model.
#[test]
fn resize_preserves_contents() {
    init_logging();
    let mut m: ChainedMap<String, usize> = ChainedMap::with_capacity(8);
    let mut model = BTreeMap::new();
    for i in 0..100usize {
        let k = format!("key-{i}");
        m.put(k.clone(), i);
        model.insert(k, i);
    }
    for n in [1, 2, 7, 64, 1024, 3] {
        m.resize(n);
        assert_eq!(m.bucket_count(), n);
        m.check_consistency().unwrap();
        let seen: BTreeMap<String, usize> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(seen, model);
    }
}

// Test: the load accountant sees identity-hashed keys where they belong.
#[test]
fn max_load_tracks_longest_chain() {
    let mut m: ChainedMap<HashValue, &str> =
        ChainedMap::with_config(TableConfig::new().expected_len(10).load_factor(10.0)).unwrap();
    assert_eq!(m.bucket_count(), 1);
    m.resize(4);
    for h in [0, 4, 8, 1] {
        m.put(HashValue(h), "x");
    }
    assert_eq!(m.max_load(), 3);
    assert_eq!(m.load(), 1.0);
    m.remove(&HashValue(4));
    assert_eq!(m.max_load(), 2);
}

// Test: free-list recycling keeps reserved storage flat across churn.
#[test]
fn free_list_recycles_under_churn() {
    let mut m: ChainedMap<u32, [u8; 16]> = ChainedMap::with_capacity(64);
    for k in 0..64 {
        m.put(k, [0; 16]);
    }
    let reserved = m.stats().reserved;
    for round in 0..10u32 {
        for k in 0..64 {
            m.remove(&k);
        }
        for k in 0..64 {
            m.put(k, [round as u8; 16]);
        }
    }
    assert_eq!(m.stats().reserved, reserved);
    assert_eq!(m.get(&3), Some(&[9; 16]));
}

// Test: an arena-backed map behaves the same as the default one.
#[test]
fn arena_and_free_list_agree() {
    let mut a: ChainedMap<u32, u32, ArenaAllocator<u32, u32>> =
        ChainedMap::with_config(TableConfig::new()).unwrap();
    let mut f: ChainedMap<u32, u32, FreeListAllocator<u32, u32>> =
        ChainedMap::with_config(TableConfig::new()).unwrap();
    for k in (0..500).map(|i| i * 7 % 311) {
        assert_eq!(a.put(k, k), f.put(k, k));
    }
    for k in (0..311).step_by(3) {
        assert_eq!(a.remove(&k), f.remove(&k));
    }
    assert_eq!(a.len(), f.len());
    assert_eq!(a.used_memory() > 0, f.used_memory() > 0);
    let mut ka: Vec<_> = a.keys().copied().collect();
    let mut kf: Vec<_> = f.keys().copied().collect();
    ka.sort();
    kf.sort();
    assert_eq!(ka, kf);
}

// Test: a map can be built over a caller-supplied allocator.
#[test]
fn with_allocator_uses_given_storage() {
    let alloc: FreeListAllocator<u8, u8> = FreeListAllocator::with_capacity(32);
    assert_eq!(alloc.live(), 0);
    let mut m: ChainedMap<u8, u8> =
        ChainedMap::with_allocator(TableConfig::new().expected_len(32), alloc).unwrap();
    for k in 0..32 {
        m.put(k, k);
    }
    assert!(m.stats().reserved >= m.used_memory());
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.used_memory(), 0);
}

// Test: configs that skipped `build()` are validated at construction.
// Verifies: zero and vanishingly small load factors are errors, not panics.
#[test]
fn invalid_configs_are_errors() {
    let zero = TableConfig::new().expected_len(4).load_factor(0.0);
    assert_eq!(
        ChainedMap::<u32, u32>::with_config(zero).err(),
        Some(ConfigError::InvalidLoadFactor(0.0))
    );
    assert!(ChainedMap::<u32, u32>::with_load_factor(1, 1e-300).is_err());
    let huge = TableConfig::new().expected_len(usize::MAX);
    assert!(matches!(
        ChainedMap::<u32, u32, _>::with_allocator(huge, FreeListAllocator::new()),
        Err(ConfigError::TooManyBuckets { .. })
    ));
}

// Test: churn that empties buckets and refills others.
// Scenario: a bucket drains to zero, then a different bucket gets the next
// record; both must keep their own counts.
#[test]
fn emptied_buckets_keep_exact_counts() {
    let mut m: ChainedMap<HashValue, u32> = ChainedMap::with_capacity(1);
    assert_eq!(m.bucket_count(), 2);
    m.put(HashValue(1), 1);
    m.remove(&HashValue(1));
    m.put(HashValue(0), 0);
    m.check_consistency().unwrap();
    m.put(HashValue(1), 1);
    assert_eq!(m.remove(&HashValue(0)), Some(0));
    assert_eq!(m.remove(&HashValue(1)), Some(1));
    assert!(m.is_empty());
    m.check_consistency().unwrap();
}

// Test: dropping the map drops every key and value exactly once.
#[test]
fn drop_releases_values() {
    use std::rc::Rc;
    let marker = Rc::new(());
    {
        let mut m: ChainedMap<u32, Rc<()>> = ChainedMap::new();
        for k in 0..50 {
            m.put(k, Rc::clone(&marker));
        }
        m.remove(&7);
        assert_eq!(Rc::strong_count(&marker), 50);
    }
    assert_eq!(Rc::strong_count(&marker), 1);
}
