//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManagerInstance`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Dirty page write-back before a frame is reused
//! - Pluggable eviction policies (LRU by default)

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use super::buffer_pool::BufferPool;
use super::frame::Frame;
use super::replacer::{LruReplacer, Replacer};
use super::stats::{BufferPoolStats, StatsSnapshot};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Bookkeeping guarded by the pool-wide lock.
struct PoolState {
    /// Resident pages.
    page_table: HashMap<PageId, FrameId>,
    /// Unassigned frames, consumed front first before any eviction.
    free_list: VecDeque<FrameId>,
    next_page_id: i32,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                BufferPoolManagerInstance                    │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │VecDeque<Fid> │  │ LruReplacer  │  │Arc<dyn Disk> │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: one `Mutex` over page table, free list and id allocator.
///   Fetch, new, unpin and delete hold it for their whole duration,
///   including the disk I/O they perform. Flushing an unpinned page does
///   too; flushing a pinned page waits for its latch outside the lock.
/// - `frames`: fixed size, each [`Frame`] carries its own latch and atomics.
/// - `replacer`, `stats`: synchronize internally.
///
/// # Page ids
/// An instance that is shard `i` of `n` hands out ids `i, i+n, i+2n, ...`,
/// so the owner of any id is `id % n`. A standalone pool is shard 0 of 1.
///
/// # Usage
/// ```
/// use std::sync::Arc;
/// use bucketdb::{BufferPool, BufferPoolManagerInstance, MemoryDiskManager};
///
/// let bpm = BufferPoolManagerInstance::new(10, Arc::new(MemoryDiskManager::new()));
///
/// let page_id = {
///     let mut guard = bpm.new_page_write()?;
///     guard.as_mut_slice()[0] = 0xAB;
///     guard.page_id()
/// };
///
/// let guard = bpm.fetch_page_read(page_id)?;
/// assert_eq!(guard.as_slice()[0], 0xAB);
/// # Ok::<(), bucketdb::Error>(())
/// ```
pub struct BufferPoolManagerInstance {
    frames: Vec<Frame>,
    state: Mutex<PoolState>,
    replacer: Box<dyn Replacer>,
    disk_manager: Arc<dyn DiskManager>,
    stats: BufferPoolStats,
    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
}

impl BufferPoolManagerInstance {
    /// Create a standalone pool with an LRU replacer.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: Arc<dyn DiskManager>) -> Self {
        Self::new_sharded(pool_size, 1, 0, disk_manager)
    }

    /// Create shard `instance_index` of `num_instances`.
    ///
    /// # Panics
    /// Panics if `pool_size` or `num_instances` is 0, or if
    /// `instance_index >= num_instances`.
    pub fn new_sharded(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk_manager: Arc<dyn DiskManager>,
    ) -> Self {
        Self::with_replacer(
            pool_size,
            num_instances,
            instance_index,
            disk_manager,
            Box::new(LruReplacer::new(pool_size)),
        )
    }

    /// Create a pool with a caller-supplied eviction policy.
    pub fn with_replacer(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk_manager: Arc<dyn DiskManager>,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        assert!(num_instances > 0, "num_instances must be > 0");
        assert!(
            instance_index < num_instances,
            "instance_index {} out of range for {} instances",
            instance_index,
            num_instances
        );

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        // first id owned by this instance past any existing data
        let stride = num_instances as i32;
        let existing = disk_manager.num_pages() as i32;
        let mut next_page_id = existing - existing % stride + instance_index as i32;
        if next_page_id < existing {
            next_page_id += stride;
        }

        Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::with_capacity(pool_size),
                free_list,
                next_page_id,
            }),
            replacer,
            disk_manager,
            stats: BufferPoolStats::new(),
            pool_size,
            num_instances,
            instance_index,
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn instance_index(&self) -> u32 {
        self.instance_index
    }

    /// Number of frames on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of resident pages.
    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Number of frames the replacer could evict right now.
    pub fn evictable_count(&self) -> usize {
        self.replacer.size()
    }

    /// Write the frame's image to disk and mark it clean.
    fn write_back(&self, page_id: PageId, frame: &Frame) -> Result<()> {
        {
            let page = frame.read();
            self.disk_manager.write_page(page_id, page.as_slice())?;
        }
        frame.clear_dirty();
        self.stats.record_write();
        Ok(())
    }

    fn resident_frame(&self, page_id: PageId) -> Option<&Frame> {
        let frame_id = *self.state.lock().page_table.get(&page_id)?;
        Some(&self.frames[frame_id.index()])
    }

    // ========================================================================
    // Internal: frame allocation and eviction
    // ========================================================================

    fn allocate_page_id(&self, state: &mut PoolState) -> PageId {
        let page_id = state.next_page_id;
        state.next_page_id += self.num_instances as i32;
        assert_eq!(
            page_id.rem_euclid(self.num_instances as i32) as u32,
            self.instance_index,
            "allocated page id does not belong to this instance"
        );
        PageId::new(page_id)
    }

    /// Take a free frame, or evict the replacer's victim.
    ///
    /// The returned frame is out of the page table and out of the replacer.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.victim().ok_or(Error::NoFreeFrames)?;
        let frame = &self.frames[frame_id.index()];
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            debug!("writing back dirty {} before evicting {}", old_page_id, frame_id);
            let written = {
                let page = frame.read();
                self.disk_manager.write_page(old_page_id, page.as_slice())
            };
            if let Err(e) = written {
                // victim stays resident and first in line
                self.replacer.restore(frame_id);
                return Err(e);
            }
            frame.clear_dirty();
            self.stats.record_write();
        }

        state.page_table.remove(&old_page_id);
        self.stats.record_eviction();
        debug!("evicted {} from {}", old_page_id, frame_id);
        Ok(frame_id)
    }
}

impl BufferPool for BufferPoolManagerInstance {
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            self.replacer.pin(frame_id);
            self.stats.record_hit();
            trace!("fetch {} hit in {}", page_id, frame_id);
            return Ok(frame);
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];

        let read = {
            let mut page = frame.write();
            self.disk_manager.read_page(page_id, page.as_mut_slice())
        };
        if let Err(e) = read {
            frame.reset();
            state.free_list.push_back(frame_id);
            return Err(e);
        }

        frame.assign(page_id);
        state.page_table.insert(page_id, frame_id);
        self.stats.record_miss();
        trace!("fetch {} miss, loaded into {}", page_id, frame_id);
        Ok(frame)
    }

    fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = self.allocate_page_id(&mut state);
        let frame = &self.frames[frame_id.index()];

        frame.write().reset();
        frame.assign(page_id);
        state.page_table.insert(page_id, frame_id);

        trace!("new {} in {}", page_id, frame_id);
        Ok((page_id, frame))
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            warn!("unpin of non-resident {}", page_id);
            return false;
        };
        let frame = &self.frames[frame_id.index()];

        let Some(remaining) = frame.unpin() else {
            warn!("unpin of {} with pin count 0", page_id);
            return false;
        };

        if is_dirty {
            frame.mark_dirty();
        }
        if remaining == 0 {
            self.replacer.unpin(frame_id);
        }
        true
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.index()];

        // Guards drop their latch before unpinning: an unpinned page has no
        // latch holder. Flushing never touches the replacer.
        if !frame.is_pinned() {
            self.write_back(page_id, frame)?;
            return Ok(true);
        }

        // The latch holder may itself be waiting on the pool lock. Keep the
        // frame assigned with an extra pin and wait for the latch outside it.
        frame.pin();
        drop(state);

        let written = self.write_back(page_id, frame);

        let _state = self.state.lock();
        if frame.unpin() == Some(0) {
            // every holder let go while we were writing
            self.replacer.unpin(frame_id);
        }
        written.map(|()| true)
    }

    fn flush_all_pages(&self) -> Result<()> {
        let resident: Vec<PageId> = self.state.lock().page_table.keys().copied().collect();

        for page_id in resident {
            self.flush_page(page_id)?;
        }

        self.disk_manager.sync()
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            self.disk_manager.deallocate_page(page_id)?;
            return Ok(true);
        };
        let frame = &self.frames[frame_id.index()];

        if frame.is_pinned() {
            warn!("delete of {} refused, pin count {}", page_id, frame.pin_count());
            return Ok(false);
        }

        self.disk_manager.deallocate_page(page_id)?;
        state.page_table.remove(&page_id);
        self.replacer.pin(frame_id);
        frame.reset();
        state.free_list.push_back(frame_id);

        debug!("deleted {}, {} returned to free list", page_id, frame_id);
        Ok(true)
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.resident_frame(page_id).map(Frame::pin_count)
    }

    fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.resident_frame(page_id).map(Frame::is_dirty)
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
