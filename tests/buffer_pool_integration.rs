//! Integration tests for the buffer pool manager.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use bucketdb::{BufferPool, BufferPoolManagerInstance, FileDiskManager, PageId};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn create_bpm(pool_size: usize) -> (BufferPoolManagerInstance, tempfile::TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let dm = Arc::new(FileDiskManager::create(&path).unwrap());
    (BufferPoolManagerInstance::new(pool_size, dm), dir)
}

/// Data survives several eviction cycles through the file.
#[test]
fn test_data_persistence_across_evictions() {
    let (bpm, _dir) = create_bpm(2);

    let mut page_ids = vec![];
    for i in 0u8..5 {
        let mut guard = bpm.new_page_write().unwrap();
        guard.as_mut_slice()[0] = i;
        guard.as_mut_slice()[1] = i.wrapping_mul(3);
        page_ids.push(guard.page_id());
    }

    for (i, &pid) in page_ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.as_slice()[0], i as u8);
        assert_eq!(guard.as_slice()[1], (i as u8).wrapping_mul(3));
    }
}

#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let data = b"persistent!";

    let pid;

    {
        let dm = Arc::new(FileDiskManager::create(&path).unwrap());
        let bpm = BufferPoolManagerInstance::new(10, dm);

        let mut guard = bpm.new_page_write().unwrap();
        pid = guard.page_id();
        guard.as_mut_slice()[..data.len()].copy_from_slice(data);
        drop(guard);

        bpm.flush_all_pages().unwrap();
    }

    {
        let dm = Arc::new(FileDiskManager::open(&path).unwrap());
        let bpm = BufferPoolManagerInstance::new(10, dm);

        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(&guard.as_slice()[..data.len()], data);
    }
}

/// A page allocated but evicted clean was never written; it reads as zeros.
#[test]
fn test_never_written_page_reads_zeros() {
    let (bpm, _dir) = create_bpm(1);

    let pid = bpm.new_page().unwrap().0;
    bpm.unpin_page(pid, false);
    let other = bpm.new_page().unwrap().0;
    bpm.unpin_page(other, false);

    let guard = bpm.fetch_page_read(pid).unwrap();
    assert!(guard.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn test_concurrent_writers() {
    let (bpm, _dir) = create_bpm(10);
    let bpm = Arc::new(bpm);

    let page_ids: Vec<PageId> = (0..5)
        .map(|_| bpm.new_page_write().unwrap().page_id())
        .collect();

    let mut handles = vec![];

    for (i, pid) in page_ids.iter().enumerate() {
        let bpm_clone = Arc::clone(&bpm);
        let pid = *pid;

        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let mut guard = bpm_clone.fetch_page_write(pid).unwrap();
                guard.as_mut_slice()[0] = ((i * 50 + j) % 256) as u8;
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    for (i, &pid) in page_ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.as_slice()[0], ((i * 50 + 49) % 256) as u8);
    }
}

/// Threads contending for a pool smaller than their working set, with
/// flushes running alongside.
#[test]
fn test_concurrent_eviction_and_flush() {
    let (bpm, _dir) = create_bpm(4);
    let bpm = Arc::new(bpm);

    let page_ids: Vec<PageId> = (0..16u8)
        .map(|i| {
            let mut guard = bpm.new_page_write().unwrap();
            guard.as_mut_slice()[0] = i;
            guard.page_id()
        })
        .collect();

    let mut handles = vec![];
    for t in 0..3 {
        let bpm = Arc::clone(&bpm);
        let page_ids = page_ids.clone();
        handles.push(thread::spawn(move || {
            for round in 0..100 {
                let pid = page_ids[(t * 5 + round * 3) % page_ids.len()];
                // a pool this small can be momentarily fully pinned
                if let Ok(guard) = bpm.fetch_page_read(pid) {
                    assert_eq!(guard.as_slice()[0], pid.0 as u8);
                }
            }
        }));
    }
    {
        let bpm = Arc::clone(&bpm);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                bpm.flush_all_pages().unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(bpm.evictable_count(), bpm.page_count());
}

#[test]
fn test_stats_accuracy() {
    let (bpm, _dir) = create_bpm(2);

    let pid = bpm.new_page_write().unwrap().page_id();

    for _ in 0..5 {
        let _ = bpm.fetch_page_read(pid).unwrap();
    }

    let stats = bpm.stats();
    assert_eq!(stats.cache_hits, 5);

    let _ = bpm.new_page_write().unwrap();
    let _ = bpm.new_page_write().unwrap();

    let stats = bpm.stats();
    assert!(stats.evictions >= 1);
    assert!(stats.pages_written >= 1);
}
