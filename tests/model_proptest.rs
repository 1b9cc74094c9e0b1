//! Model-based property tests for the replacer and the hash table.

use bucketdb::{
    BufferPoolManagerInstance, ExtendibleHashTable, FrameId, LruReplacer, MemoryDiskManager,
    OrdComparator, Replacer,
};
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

const FRAMES: usize = 8;

#[derive(Debug, Clone)]
enum ReplacerOp {
    Unpin(usize),
    Pin(usize),
    Victim,
}

fn replacer_op() -> impl Strategy<Value = ReplacerOp> {
    prop_oneof![
        (0..FRAMES).prop_map(ReplacerOp::Unpin),
        (0..FRAMES).prop_map(ReplacerOp::Pin),
        Just(ReplacerOp::Victim),
    ]
}

#[derive(Debug, Clone)]
enum TableOp {
    Insert(i32, i32),
    Remove(i32, i32),
}

// At most three values per key stays below the bucket capacity, and the
// odd multiplier keeps the low 9 hash bits of distinct keys distinct.
fn table_op() -> impl Strategy<Value = TableOp> {
    prop_oneof![
        3 => (0..64i32, 0..3i32).prop_map(|(k, v)| TableOp::Insert(k, v)),
        2 => (0..64i32, 0..3i32).prop_map(|(k, v)| TableOp::Remove(k, v)),
    ]
}

fn scramble(key: &i32) -> u32 {
    (*key as u32).wrapping_mul(0x9E37_79B1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_lru_matches_model(ops in prop::collection::vec(replacer_op(), 1..200)) {
        let replacer = LruReplacer::new(FRAMES);
        let mut model: VecDeque<usize> = VecDeque::new();

        for op in ops {
            match op {
                ReplacerOp::Unpin(f) => {
                    replacer.unpin(FrameId::new(f));
                    if !model.contains(&f) {
                        model.push_back(f);
                    }
                }
                ReplacerOp::Pin(f) => {
                    replacer.pin(FrameId::new(f));
                    model.retain(|&m| m != f);
                }
                ReplacerOp::Victim => {
                    prop_assert_eq!(replacer.victim(), model.pop_front().map(FrameId::new));
                }
            }
            prop_assert_eq!(replacer.size(), model.len());
        }
    }

    #[test]
    fn prop_hash_table_matches_model(ops in prop::collection::vec(table_op(), 1..300)) {
        let bpm = Arc::new(BufferPoolManagerInstance::new(
            32,
            Arc::new(MemoryDiskManager::new()),
        ));
        let table = ExtendibleHashTable::<i32, i32, _, _, _>::with_bucket_capacity(
            Arc::clone(&bpm),
            OrdComparator,
            scramble as fn(&i32) -> u32,
            4,
        )
        .unwrap();
        let mut model: HashSet<(i32, i32)> = HashSet::new();

        for op in ops {
            match op {
                TableOp::Insert(k, v) => {
                    prop_assert_eq!(table.insert(&k, &v).unwrap(), model.insert((k, v)));
                }
                TableOp::Remove(k, v) => {
                    prop_assert_eq!(table.remove(&k, &v).unwrap(), model.remove(&(k, v)));
                }
            }
            table.verify_integrity().unwrap();
            prop_assert_eq!(bpm.evictable_count(), bpm.page_count());
        }

        for k in 0..64 {
            let mut values = table.get_value(&k).unwrap();
            values.sort();
            let mut expected: Vec<i32> = model.iter().filter(|(mk, _)| *mk == k).map(|&(_, v)| v).collect();
            expected.sort();
            prop_assert_eq!(values, expected);
        }
        table.verify_integrity().unwrap();
        prop_assert_eq!(bpm.evictable_count(), bpm.page_count());
    }
}
