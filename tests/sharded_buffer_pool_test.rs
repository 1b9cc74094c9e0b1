//! Sharded buffer pool tests.

use bucketdb::{BufferPool, Error, MemoryDiskManager, PageId, ShardedBufferPoolManager};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn create_sharded(num_instances: u32, pool_size: usize) -> ShardedBufferPoolManager {
    let _ = env_logger::builder().is_test(true).try_init();
    ShardedBufferPoolManager::new(num_instances, pool_size, Arc::new(MemoryDiskManager::new()))
}

/// With two shards, every id handed out belongs to the shard `id % 2`.
#[test]
fn test_two_shard_ownership() {
    let bpm = create_sharded(2, 5);

    let mut owners = vec![];
    for _ in 0..10 {
        let (pid, _) = bpm.new_page().unwrap();
        let owner = bpm.instance_for(pid).unwrap();
        assert_eq!(pid.0 % 2, owner.instance_index() as i32);
        assert_eq!(owner.pin_count(pid), Some(1));
        owners.push(owner.instance_index());
    }

    // allocation alternates between the shards
    assert_eq!(owners, vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
    assert!(matches!(bpm.new_page(), Err(Error::NoFreeFrames)));
}

#[test]
fn test_pool_size_is_sum_of_shards() {
    let bpm = create_sharded(5, 3);
    assert_eq!(bpm.pool_size(), 15);
    assert_eq!(bpm.num_instances(), 5);
    assert_eq!(bpm.free_frame_count(), 15);
}

#[test]
fn test_fetch_unpin_flush_delete_route() {
    let bpm = create_sharded(3, 4);

    let ids: Vec<PageId> = (0..9)
        .map(|i| {
            let mut guard = bpm.new_page_write().unwrap();
            guard.as_mut_slice()[0] = i as u8 + 1;
            guard.page_id()
        })
        .collect();

    for (i, &pid) in ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.as_slice()[0], i as u8 + 1);
        drop(guard);

        assert_eq!(bpm.is_dirty(pid), Some(true));
        assert!(bpm.flush_page(pid).unwrap());
        assert_eq!(bpm.is_dirty(pid), Some(false));
    }

    assert!(bpm.delete_page(ids[4]).unwrap());
    assert_eq!(bpm.pin_count(ids[4]), None);
    assert_eq!(bpm.page_count(), 8);
    assert!(!bpm.unpin_page(ids[4], false));
}

#[test]
fn test_full_shard_is_skipped() {
    let bpm = create_sharded(3, 1);

    let held: Vec<PageId> = (0..3).map(|_| bpm.new_page().unwrap().0).collect();
    assert!(bpm.new_page().is_err());

    // free only shard 2; any starting point must find it
    assert!(bpm.unpin_page(held[2], false));
    let (pid, _) = bpm.new_page().unwrap();
    assert_eq!(pid.0 % 3, 2);
    assert_eq!(pid, PageId::new(5));
}

#[test]
fn test_concurrent_allocation_unique_ids() {
    let bpm = Arc::new(create_sharded(4, 16));
    let mut handles = vec![];

    for _ in 0..4 {
        let bpm = Arc::clone(&bpm);
        handles.push(thread::spawn(move || {
            let mut ids = vec![];
            for _ in 0..32 {
                let guard = bpm.new_page_write().unwrap();
                ids.push(guard.page_id());
            }
            ids
        }));
    }

    let mut all = HashSet::new();
    for h in handles {
        for pid in h.join().unwrap() {
            let owner = bpm.instance_for(pid).unwrap();
            assert_eq!(pid.0 % 4, owner.instance_index() as i32);
            assert!(all.insert(pid));
        }
    }
    assert_eq!(all.len(), 128);
}
