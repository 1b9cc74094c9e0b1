//! The page cache contract shared by single and sharded pools.

use super::frame::Frame;
use super::page_guard::{PageReadGuard, PageWriteGuard};
use super::stats::StatsSnapshot;
use crate::common::{PageId, Result};

/// A fixed-size cache of disk pages with pin-count lifetimes.
///
/// Every successful [`fetch_page`](Self::fetch_page) or
/// [`new_page`](Self::new_page) pins the page once, and the caller owes
/// exactly one [`unpin_page`](Self::unpin_page) for it. The guard methods
/// pay that debt automatically on drop.
///
/// A pinned page is never evicted. When every frame is pinned, fetching a
/// non-resident page or allocating a new one fails with
/// [`Error::NoFreeFrames`](crate::Error::NoFreeFrames); the caller may
/// retry once pins are released.
pub trait BufferPool: Send + Sync {
    /// Pin `page_id`, reading it from disk if it is not resident.
    fn fetch_page(&self, page_id: PageId) -> Result<&Frame>;

    /// Allocate a fresh zeroed page and pin it.
    fn new_page(&self) -> Result<(PageId, &Frame)>;

    /// Release one pin. `is_dirty` can only set the dirty flag, never clear it.
    ///
    /// Returns `false` if the page is not resident or not pinned.
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool;

    /// Write the page to disk whether or not it is dirty.
    ///
    /// Returns `Ok(false)` if the page is not resident. Must not be called
    /// while the caller holds the page's write latch.
    fn flush_page(&self, page_id: PageId) -> Result<bool>;

    /// Flush every resident page, then sync the disk.
    fn flush_all_pages(&self) -> Result<()>;

    /// Drop the page from the pool and release its disk block.
    ///
    /// Returns `Ok(true)` if the page is gone afterwards (including when it
    /// was never resident) and `Ok(false)` if it is still pinned.
    fn delete_page(&self, page_id: PageId) -> Result<bool>;

    /// Total number of frames.
    fn pool_size(&self) -> usize;

    /// Current pin count of a resident page.
    fn pin_count(&self, page_id: PageId) -> Option<u32>;

    /// Dirty flag of a resident page.
    fn is_dirty(&self, page_id: PageId) -> Option<bool>;

    fn stats(&self) -> StatsSnapshot;

    /// Fetch a page and take its shared latch.
    fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>>
    where
        Self: Sized,
    {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, page_id, frame))
    }

    /// Fetch a page and take its exclusive latch.
    fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>>
    where
        Self: Sized,
    {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(self, page_id, frame))
    }

    /// Allocate a page and take its exclusive latch.
    fn new_page_write(&self) -> Result<PageWriteGuard<'_>>
    where
        Self: Sized,
    {
        let (page_id, frame) = self.new_page()?;
        Ok(PageWriteGuard::new(self, page_id, frame))
    }
}
