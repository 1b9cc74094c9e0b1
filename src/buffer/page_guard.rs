//! RAII guards for page access.
//!
//! These guards pair a pin with the page latch:
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (unpins dirty)
//!
//! A guard's latch field is declared before its pin, and fields drop in
//! declaration order, so the pool never sees an unpinned frame whose latch
//! is still held.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::buffer_pool::BufferPool;
use super::frame::Frame;
use crate::common::PageId;
use crate::storage::page::Page;

/// One pin on a page, released on drop.
struct Pin<'a> {
    pool: &'a dyn BufferPool,
    page_id: PageId,
    dirty: bool,
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, self.dirty);
    }
}

/// Guard for read-only page access.
///
/// # Example
/// ```ignore
/// let guard = bpm.fetch_page_read(page_id)?;
/// let data = guard.as_slice();  // Deref to &Page
/// // guard drops here, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    lock: RwLockReadGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageReadGuard<'a> {
    /// Latch an already pinned frame. The guard takes over that pin.
    pub(crate) fn new(pool: &'a dyn BufferPool, page_id: PageId, frame: &'a Frame) -> Self {
        Self {
            lock: frame.read(),
            pin: Pin {
                pool,
                page_id,
                dirty: false,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

/// Guard for exclusive write access to a page.
///
/// The page is unpinned dirty when the guard drops, whether or not it was
/// actually modified.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_write(page_id)?;
/// guard.as_mut_slice()[0] = 0xFF;  // DerefMut to &mut Page
/// // guard drops here, page unpinned dirty
/// ```
pub struct PageWriteGuard<'a> {
    lock: RwLockWriteGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageWriteGuard<'a> {
    /// Latch an already pinned frame. The guard takes over that pin.
    pub(crate) fn new(pool: &'a dyn BufferPool, page_id: PageId, frame: &'a Frame) -> Self {
        Self {
            lock: frame.write(),
            pin: Pin {
                pool,
                page_id,
                dirty: true,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        &mut self.lock
    }
}
