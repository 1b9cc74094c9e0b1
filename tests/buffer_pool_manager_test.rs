//! Buffer pool manager scenario tests.
//!
//! These drive the explicit fetch/new/unpin API the way an index does,
//! including the exhaustion cases a caller has to recover from.

use bucketdb::{BufferPool, BufferPoolManagerInstance, Error, MemoryDiskManager, PageId};
use std::sync::Arc;

const FRAMES: usize = 10;

fn create_bpm(pool_size: usize) -> (BufferPoolManagerInstance, Arc<MemoryDiskManager>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dm = Arc::new(MemoryDiskManager::new());
    (BufferPoolManagerInstance::new(pool_size, dm.clone()), dm)
}

fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0;
}

fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

// ============================================================================
// Exhaustion and recovery
// ============================================================================

/// Three frames, three pinned pages: the fourth allocation fails until a
/// pin is released.
#[test]
fn test_three_frame_pool() {
    let (bpm, _dm) = create_bpm(3);

    let ids: Vec<PageId> = (0..3).map(|_| bpm.new_page().unwrap().0).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
    for &pid in &ids {
        assert_eq!(bpm.pin_count(pid), Some(1));
    }

    let err = bpm.new_page().unwrap_err();
    assert!(matches!(err, Error::NoFreeFrames));
    assert!(err.is_exhaustion());

    assert!(bpm.unpin_page(ids[0], false));
    assert!(bpm.new_page().is_ok());
}

#[test]
fn test_sample() {
    let (bpm, _dm) = create_bpm(FRAMES);

    let (page0, frame0) = bpm.new_page().unwrap();
    assert_eq!(page0, PageId::new(0));
    copy_string(frame0.write().as_mut_slice(), "Hello");
    assert_eq!(read_string(frame0.read().as_slice()), "Hello");

    // fill up the pool
    for _ in 1..FRAMES {
        assert!(bpm.new_page().is_ok());
    }
    // every frame is pinned
    for _ in FRAMES..FRAMES * 2 {
        assert!(bpm.new_page().is_err());
    }

    // release pages 0..5 and allocate four more, evicting 0..4
    for i in 0..5 {
        assert!(bpm.unpin_page(PageId::new(i), true));
    }
    for _ in 0..4 {
        assert!(bpm.new_page().is_ok());
    }

    // page 0 comes back from disk intact
    let frame = bpm.fetch_page(page0).unwrap();
    assert_eq!(read_string(frame.read().as_slice()), "Hello");

    // unpin it, let a new page take its frame, and it cannot come back
    assert!(bpm.unpin_page(page0, true));
    assert!(bpm.new_page().is_ok());
    assert!(matches!(bpm.fetch_page(page0), Err(Error::NoFreeFrames)));
}

#[test]
fn test_binary_data() {
    let (bpm, _dm) = create_bpm(FRAMES);

    let mut random_binary_data = [0u8; bucketdb::PAGE_SIZE];
    for (i, byte) in random_binary_data.iter_mut().enumerate() {
        *byte = (i.wrapping_mul(2654435761) >> 7) as u8;
    }
    // embedded terminators must survive
    random_binary_data[bucketdb::PAGE_SIZE / 2] = 0;
    random_binary_data[bucketdb::PAGE_SIZE - 1] = 0;

    let (page0, frame0) = bpm.new_page().unwrap();
    frame0
        .write()
        .as_mut_slice()
        .copy_from_slice(&random_binary_data);

    for _ in 1..FRAMES {
        bpm.new_page().unwrap();
    }
    assert!(bpm.new_page().is_err());

    for i in 0..5 {
        assert!(bpm.unpin_page(PageId::new(i), true));
        assert!(bpm.flush_page(PageId::new(i)).unwrap());
    }
    for _ in 0..5 {
        let (pid, _) = bpm.new_page().unwrap();
        assert!(bpm.unpin_page(pid, false));
    }

    let frame = bpm.fetch_page(page0).unwrap();
    assert_eq!(frame.read().as_slice(), &random_binary_data[..]);
    assert!(bpm.unpin_page(page0, true));
}

// ============================================================================
// Pin accounting
// ============================================================================

#[test]
fn test_unpin_more_than_fetched_fails() {
    let (bpm, _dm) = create_bpm(FRAMES);

    let (pid, _) = bpm.new_page().unwrap();
    for _ in 0..3 {
        bpm.fetch_page(pid).unwrap();
    }
    assert_eq!(bpm.pin_count(pid), Some(4));

    for _ in 0..4 {
        assert!(bpm.unpin_page(pid, false));
    }
    assert!(!bpm.unpin_page(pid, false));
    assert_eq!(bpm.pin_count(pid), Some(0));
}

#[test]
fn test_pinned_page_never_evicted() {
    let (bpm, _dm) = create_bpm(4);

    let (hot, frame) = bpm.new_page().unwrap();
    frame.write().as_mut_slice()[0] = 0x77;

    for _ in 0..50 {
        let (pid, _) = bpm.new_page().unwrap();
        assert!(bpm.unpin_page(pid, true));
        assert_eq!(bpm.pin_count(hot), Some(1));
    }

    let frame = bpm.fetch_page(hot).unwrap();
    assert_eq!(frame.read().as_slice()[0], 0x77);
    assert_eq!(bpm.stats().cache_hits, 1);
}

#[test]
fn test_delete_then_reuse_frame() {
    let (bpm, dm) = create_bpm(2);

    let (p0, _) = bpm.new_page().unwrap();
    let (p1, _) = bpm.new_page().unwrap();
    assert!(!bpm.delete_page(p0).unwrap());

    bpm.unpin_page(p0, true);
    assert!(bpm.delete_page(p0).unwrap());
    assert_eq!(bpm.free_frame_count(), 1);
    assert!(!dm.contains(p0));

    // the freed frame is used before anything is evicted
    let (p2, _) = bpm.new_page().unwrap();
    assert_eq!(bpm.stats().evictions, 0);
    assert_eq!(bpm.pin_count(p1), Some(1));
    assert_eq!(bpm.pin_count(p2), Some(1));
}
