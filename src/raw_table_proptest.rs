#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can reach the
// accountant and element ids directly.

use crate::alloc::ElementAllocator;
use crate::arena::ArenaAllocator;
use crate::config::TableConfig;
use crate::free_list::FreeListAllocator;
use crate::hash::{FnvHasher, KeyHash};
use crate::raw_table::{InsertError, RawTable};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl KeyHash for Key {
    fn write_key(&self, state: &mut FnvHasher) {
        self.0.write_key(state);
    }
}
impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

// Every instance hashes to the same value, so all keys share one chain.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
struct Colliding(String);
impl KeyHash for Colliding {
    fn write_key(&self, _state: &mut FnvHasher) {}
}
impl From<String> for Colliding {
    fn from(s: String) -> Self {
        Colliding(s)
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    PutWith(usize, i32),
    TryInsert(usize, i32),
    Remove(usize),
    Get(usize),
    Absent(String),
    Mutate(usize, i32),
    Resize(usize),
    ShrinkToFit,
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::PutWith(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::TryInsert(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[0-9]{1,3}".prop_map(Op::Absent),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (1usize..40).prop_map(Op::Resize),
            1 => Just(Op::ShrinkToFit),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap. After every op:
// - the table passes its full consistency check;
// - `len` matches the model;
// - every tracked element id still resolves to its key, resizes included;
// - after an insert that created an element, load is within the load factor.
fn run_scenario<K, A>(pool: &[String], ops: Vec<Op>, load_factor: f64) -> Result<(), TestCaseError>
where
    K: Clone + Eq + Hash + Ord + fmt::Debug + KeyHash + From<String>,
    A: ElementAllocator<Key = K, Value = i32> + Default,
{
    let config = TableConfig::new().expected_len(2).load_factor(load_factor);
    let mut sut: RawTable<K, i32, A> = RawTable::with_config(config).unwrap();
    let mut model: HashMap<K, i32> = HashMap::new();
    let mut ids: HashMap<K, A::Id> = HashMap::new();
    let calls = Cell::new(0);
    let key = |i: usize| K::from(pool[i].clone());

    for op in ops {
        let mut created = false;
        match op.clone() {
            Op::Put(i, v) => {
                let k = key(i);
                let prev = sut.insert(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                if prev.is_none() {
                    created = true;
                    let id = sut.find(&k).unwrap();
                    ids.insert(k, id);
                }
            }
            Op::PutWith(i, v) => {
                let k = key(i);
                let before = calls.get();
                let added = sut.put_with(k.clone(), || {
                    calls.set(calls.get() + 1);
                    v
                });
                if model.contains_key(&k) {
                    prop_assert!(!added.is_created());
                    prop_assert_eq!(calls.get(), before, "value built for a present key");
                    prop_assert_eq!(Some(&added.id()), ids.get(&k));
                } else {
                    prop_assert!(added.is_created());
                    prop_assert_eq!(calls.get(), before + 1);
                    model.insert(k.clone(), v);
                    ids.insert(k, added.id());
                    created = true;
                }
            }
            Op::TryInsert(i, v) => {
                let k = key(i);
                match sut.try_insert(k.clone(), v) {
                    Ok(id) => {
                        prop_assert!(!model.contains_key(&k));
                        model.insert(k.clone(), v);
                        ids.insert(k, id);
                        created = true;
                    }
                    Err(InsertError::DuplicateKey) => prop_assert!(model.contains_key(&k)),
                }
            }
            Op::Remove(i) => {
                let k = key(i);
                let got = sut.remove(&k);
                let want = model.remove_entry(&k);
                prop_assert_eq!(got, want);
                ids.remove(&k);
                prop_assert!(sut.remove(&k).is_none(), "second remove must miss");
            }
            Op::Get(i) => {
                let k = key(i);
                prop_assert_eq!(sut.get(&k).map(|(_, v)| *v), model.get(&k).copied());
            }
            Op::Absent(s) => {
                let k = K::from(s);
                prop_assert_eq!(sut.find(&k).is_some(), model.contains_key(&k));
            }
            Op::Mutate(i, d) => {
                let k = key(i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::Resize(n) => {
                sut.resize(n);
                prop_assert_eq!(sut.bucket_count(), n);
            }
            Op::ShrinkToFit => sut.shrink_to_fit(),
            Op::Clear => {
                sut.clear();
                model.clear();
                ids.clear();
            }
            Op::Iterate => {
                let seen: BTreeSet<(K, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let want: BTreeSet<(K, i32)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(sut.iter().count(), sut.len(), "iteration repeated an element");
                prop_assert_eq!(seen, want);
            }
        }

        if let Err(e) = sut.check_consistency() {
            return Err(TestCaseError::fail(format!("after {op:?}: {e}")));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.allocator().live(), model.len());
        for (k, &id) in &ids {
            prop_assert_eq!(sut.entry(id).0, k);
        }
        if created {
            prop_assert!(sut.load() <= sut.load_factor());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_free_list_table((pool, ops) in arb_scenario(), lf in 0.25f64..4.0) {
        run_scenario::<Key, FreeListAllocator<Key, i32>>(&pool, ops, lf)?;
    }

    #[test]
    fn prop_arena_table((pool, ops) in arb_scenario(), lf in 0.25f64..4.0) {
        run_scenario::<Key, ArenaAllocator<Key, i32>>(&pool, ops, lf)?;
    }

    // Worst case: every key in one chain.
    #[test]
    fn prop_single_chain((pool, ops) in arb_scenario()) {
        run_scenario::<Colliding, FreeListAllocator<Colliding, i32>>(&pool, ops, 0.75)?;
    }
}
