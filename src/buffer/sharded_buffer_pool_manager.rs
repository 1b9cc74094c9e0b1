//! Sharded buffer pool: N independent instances behind one [`BufferPool`].

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use super::buffer_pool::BufferPool;
use super::buffer_pool_manager_instance::BufferPoolManagerInstance;
use super::frame::Frame;
use super::stats::StatsSnapshot;
use crate::common::{Error, PageId, Result};
use crate::storage::DiskManager;

/// Partitions pages across independent [`BufferPoolManagerInstance`]s.
///
/// Instance `i` owns every page id with `id % n == i` and only ever
/// allocates such ids, so routing needs no table and pages never migrate.
/// Each instance has its own lock, so traffic to different shards does
/// not contend.
///
/// New pages are spread round-robin: each call starts at a rotating
/// cursor and tries every instance at most once.
pub struct ShardedBufferPoolManager {
    instances: Vec<BufferPoolManagerInstance>,
    next_instance: Mutex<usize>,
}

impl ShardedBufferPoolManager {
    /// Create `num_instances` shards of `pool_size` frames each, all backed
    /// by the same disk manager.
    ///
    /// # Panics
    /// Panics if `num_instances` or `pool_size` is 0.
    pub fn new(num_instances: u32, pool_size: usize, disk_manager: Arc<dyn DiskManager>) -> Self {
        assert!(num_instances > 0, "num_instances must be > 0");

        let instances = (0..num_instances)
            .map(|index| {
                BufferPoolManagerInstance::new_sharded(
                    pool_size,
                    num_instances,
                    index,
                    Arc::clone(&disk_manager),
                )
            })
            .collect();

        Self {
            instances,
            next_instance: Mutex::new(0),
        }
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// The shard at `index`.
    pub fn instance(&self, index: usize) -> Option<&BufferPoolManagerInstance> {
        self.instances.get(index)
    }

    /// The shard owning `page_id`, or `None` for an invalid id.
    pub fn instance_for(&self, page_id: PageId) -> Option<&BufferPoolManagerInstance> {
        if !page_id.is_valid() {
            return None;
        }
        self.instances
            .get(page_id.0 as usize % self.instances.len())
    }

    pub fn free_frame_count(&self) -> usize {
        self.instances.iter().map(|i| i.free_frame_count()).sum()
    }

    pub fn page_count(&self) -> usize {
        self.instances.iter().map(|i| i.page_count()).sum()
    }
}

impl BufferPool for ShardedBufferPoolManager {
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        self.instance_for(page_id)
            .ok_or(Error::InvalidPageId(page_id.0))?
            .fetch_page(page_id)
    }

    fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut cursor = self.next_instance.lock();
        let n = self.instances.len();

        for _ in 0..n {
            let index = *cursor;
            *cursor = (index + 1) % n;

            match self.instances[index].new_page() {
                Ok(allocated) => return Ok(allocated),
                Err(Error::NoFreeFrames) => {
                    debug!("shard {} has no free frames", index);
                }
                Err(e) => return Err(e),
            }
        }

        warn!("all {} shards are fully pinned", n);
        Err(Error::NoFreeFrames)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id)
            .is_some_and(|instance| instance.unpin_page(page_id, is_dirty))
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool> {
        match self.instance_for(page_id) {
            Some(instance) => instance.flush_page(page_id),
            None => Ok(false),
        }
    }

    fn flush_all_pages(&self) -> Result<()> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool> {
        self.instance_for(page_id)
            .ok_or(Error::InvalidPageId(page_id.0))?
            .delete_page(page_id)
    }

    fn pool_size(&self) -> usize {
        self.instances.iter().map(|i| i.pool_size()).sum()
    }

    fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.instance_for(page_id)?.pin_count(page_id)
    }

    fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.instance_for(page_id)?.is_dirty(page_id)
    }

    fn stats(&self) -> StatsSnapshot {
        self.instances.iter().map(|i| i.stats()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDiskManager;

    fn create_sharded(num_instances: u32, pool_size: usize) -> ShardedBufferPoolManager {
        let _ = env_logger::builder().is_test(true).try_init();
        ShardedBufferPoolManager::new(
            num_instances,
            pool_size,
            Arc::new(MemoryDiskManager::new()),
        )
    }

    #[test]
    fn test_round_robin_allocation() {
        let bpm = create_sharded(3, 2);

        let ids: Vec<i32> = (0..6).map(|_| bpm.new_page().unwrap().0 .0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(bpm.pool_size(), 6);
        assert_eq!(bpm.free_frame_count(), 0);
    }

    #[test]
    fn test_skips_full_shard() {
        let bpm = create_sharded(2, 1);

        let (p0, _) = bpm.new_page().unwrap();
        let (p1, _) = bpm.new_page().unwrap();
        assert_eq!((p0.0, p1.0), (0, 1));

        assert!(matches!(bpm.new_page(), Err(Error::NoFreeFrames)));

        // only shard 1 has room; the cursor starts at shard 0 and moves on
        bpm.unpin_page(p1, false);
        let (p3, _) = bpm.new_page().unwrap();
        assert_eq!(p3.0 % 2, 1);
    }

    #[test]
    fn test_routing() {
        let bpm = create_sharded(4, 2);

        for _ in 0..8 {
            let (pid, _) = bpm.new_page().unwrap();
            let owner = bpm.instance_for(pid).unwrap();
            assert_eq!(owner.instance_index() as i32, pid.0 % 4);
            assert_eq!(owner.pin_count(pid), Some(1));
            assert!(bpm.unpin_page(pid, true));
        }

        assert_eq!(bpm.page_count(), 8);
        assert!(bpm.instance_for(PageId::INVALID).is_none());
        assert!(!bpm.unpin_page(PageId::INVALID, false));
        assert!(matches!(
            bpm.fetch_page(PageId::INVALID),
            Err(Error::InvalidPageId(-1))
        ));
    }

    #[test]
    fn test_aggregated_stats() {
        let bpm = create_sharded(2, 2);

        for _ in 0..4 {
            let guard = bpm.new_page_write().unwrap();
            drop(guard);
        }
        for id in 0..4 {
            drop(bpm.fetch_page_read(PageId::new(id)).unwrap());
        }

        bpm.flush_all_pages().unwrap();
        let stats = bpm.stats();
        assert_eq!(stats.cache_hits, 4);
        assert_eq!(stats.pages_written, 4);
    }
}
