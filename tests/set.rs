// ChainedSet integration suite.
//
// Invariants exercised:
// - `put` reports whether the key was new; `remove` whether it was present.
// - Identity-hashed keys (`HashValue`) index buckets by their own value.
// - Resizing and clearing keep the set consistent.
use chained_hashmap::{fnv1a_64, ArenaAllocator, ChainedSet, HashValue, KeyHash, TableConfig};
use std::collections::HashSet;

// Test: membership round trip.
#[test]
fn put_contains_remove() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut s = ChainedSet::new();
    for w in ["ant", "bee", "cat"] {
        assert!(s.put(w.to_string()));
    }
    assert!(!s.put("bee".to_string()));
    assert_eq!(s.len(), 3);
    assert!(s.contains("ant"));
    assert!(s.remove("ant"));
    assert!(!s.remove("ant"));
    assert!(!s.contains("ant"));
    assert_eq!(s.get("cat").map(String::as_str), Some("cat"));
}

// Test: string keys hash with 64-bit FNV-1a of their bytes.
#[test]
fn string_keys_use_fnv1a() {
    assert_eq!("hello".to_hash(), fnv1a_64(b"hello"));
    assert_eq!(String::from("hello").to_hash(), fnv1a_64(b"hello"));
}

// Test: dedupe a stream of precomputed hashes.
#[test]
fn dedupe_hash_values() {
    let input: Vec<u64> = (0..2_000u64).map(|i| (i * i) % 997).collect();
    let mut s: ChainedSet<HashValue> = ChainedSet::with_capacity(16);
    let mut fresh = 0;
    for &h in &input {
        if s.put(HashValue(h)) {
            fresh += 1;
        }
    }
    let model: HashSet<u64> = input.iter().copied().collect();
    assert_eq!(fresh, model.len());
    assert_eq!(s.len(), model.len());
    for h in model {
        assert!(s.contains(&HashValue(h)));
    }
    s.check_consistency().unwrap();
}

// Test: arena-backed set through clear and shrink.
#[test]
fn arena_set_clear_then_reuse() {
    let mut s: ChainedSet<u64, ArenaAllocator<u64, ()>> =
        ChainedSet::with_config(TableConfig::new().expected_len(100)).unwrap();
    for k in 0..100 {
        s.put(k);
    }
    s.clear();
    assert!(s.is_empty());
    assert_eq!(s.used_memory(), 0);
    s.put(42);
    s.shrink_to_fit();
    assert_eq!(s.bucket_count(), 2);
    assert!(s.contains(&42));
    s.check_consistency().unwrap();
}

// Test: explicit resize keeps membership.
#[test]
fn resize_keeps_members() {
    let mut s: ChainedSet<i32> = (-20..20).collect();
    s.resize(1);
    assert_eq!(s.max_load(), 40);
    s.resize(97);
    for k in -20..20 {
        assert!(s.contains(&k));
    }
    assert_eq!(s.iter().count(), 40);
}
