// Parking-stack protocol, driven through the public building blocks.
//
// Invariants exercised:
// - LIFO order; pop past empty is `None`.
// - Parked elements keep their ids and contents.
// - Elements left parked when the stack closes are released.
// - A resize built from Bucket, LoadAccountant and an allocator by hand
//   relocates every element exactly once.
use chained_hashmap::{
    ArenaAllocator, Bucket, ElementAllocator, FreeListAllocator, KeyHash, LoadAccountant,
    NodeStore, ParkingStack,
};

fn lifo_round_trip<A>(mut alloc: A)
where
    A: ElementAllocator<Key = u32, Value = u32>,
{
    let ids: Vec<A::Id> = (0..5).map(|k| alloc.acquire(k, k + 100)).collect();
    let popped = alloc.park(ids.len(), |stack| {
        for &id in &ids {
            stack.push(id);
        }
        assert_eq!(stack.len(), 5);
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            out.push(id);
        }
        assert!(stack.pop().is_none());
        assert!(stack.is_empty());
        out
    });
    let expected: Vec<A::Id> = ids.iter().rev().copied().collect();
    assert_eq!(popped, expected);
    for (k, &id) in ids.iter().enumerate() {
        let node = alloc.node(id);
        assert_eq!((node.key, node.value), (k as u32, k as u32 + 100));
    }
    assert_eq!(alloc.live(), 5);
}

#[test]
fn free_list_parking_is_lifo() {
    lifo_round_trip(FreeListAllocator::new());
}

#[test]
fn arena_parking_is_lifo() {
    lifo_round_trip(ArenaAllocator::new());
}

// Test: closing a stack with elements still parked releases them.
// Verifies: the free list grows by the number of leftovers and the
// allocator accepts new work afterwards.
#[test]
fn leftovers_released_on_close() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut alloc: FreeListAllocator<String, ()> = FreeListAllocator::new();
    let ids: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|k| alloc.acquire(k.to_string(), ()))
        .collect();
    alloc.park(4, |stack| {
        for &id in &ids {
            stack.push(id);
        }
        stack.pop();
    });
    assert_eq!(alloc.live(), 1);
    assert_eq!(alloc.free_len(), 3);
    assert_eq!(alloc.node(ids[3]).key, "d");
    let again = alloc.acquire("e".to_string(), ());
    assert!(ids[..3].contains(&again), "recycled slot is reused");
}

// Test: the stack is released even if the closure panics.
#[test]
fn panic_while_parked_closes_stack() {
    let mut alloc: FreeListAllocator<u8, u8> = FreeListAllocator::new();
    let id = alloc.acquire(1, 1);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        alloc.park(1, |stack| {
            stack.push(id);
            panic!("boom");
        })
    }));
    assert!(res.is_err());
    assert_eq!(alloc.live(), 0);
    let id = alloc.acquire(2, 2);
    assert_eq!(alloc.node(id).key, 2);
}

// Test: a manual resize with the table's building blocks.
// Scenario: 40 keys in 3 buckets move to 11 buckets through the arena's
// parking stack. Verifies every key lands in `hash % 11` and the
// accountant's totals match the chains.
#[test]
fn manual_resize_protocol() {
    let mut alloc: ArenaAllocator<u64, ()> = ArenaAllocator::new();
    let mut buckets = vec![Bucket::new(); 3];
    let mut load = LoadAccountant::new(3);
    for k in 0..40u64 {
        let index = (k.to_hash() % 3) as usize;
        assert!(buckets[index].add_with(&mut alloc, k, || ()).is_created());
        load.put(index);
    }
    assert_eq!(load.len(), 40);

    let len = load.len();
    alloc.park(len, |stack| {
        for record in load.records() {
            while let Some(id) = buckets[record.index].take_first(stack) {
                stack.push(id);
            }
        }
        assert_eq!(stack.len(), 40);
        load.clear_and_resize(11);
        buckets = vec![Bucket::new(); 11];
        while let Some(id) = stack.pop() {
            let index = (stack.node(id).key.to_hash() % 11) as usize;
            buckets[index].link(stack, id);
            load.put(index);
        }
    });

    assert!(load.is_consistent());
    assert_eq!(load.len(), 40);
    assert_eq!(alloc.live(), 40);
    let mut total = 0;
    for (index, bucket) in buckets.iter().enumerate() {
        assert_eq!(bucket.len(&alloc), load[index]);
        for id in bucket.iter(&alloc) {
            assert_eq!((alloc.node(id).key.to_hash() % 11) as usize, index);
            total += 1;
        }
    }
    assert_eq!(total, 40);
}
