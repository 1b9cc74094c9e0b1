//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the metadata the pool needs to manage it:
//! - Which page is resident ([`PageId::INVALID`] when free)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// The pool allocates all frames at startup and never moves them, so a
/// `&Frame` stays valid for the pool's lifetime. Which page a frame holds
/// is only changed while the owning pool's state lock is held and the
/// frame is unpinned.
///
/// # Thread Safety
/// - `page`: `RwLock`, the per-page latch taken by page guards
/// - `page_id`, `pin_count`, `is_dirty`: atomics, readable without locks
#[derive(Debug)]
pub struct Frame {
    page: RwLock<Page>,
    page_id: AtomicI32,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            page_id: AtomicI32::new(PageId::INVALID.0),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Page latch
    // ========================================================================

    /// Acquire the page's shared latch.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire the page's exclusive latch.
    ///
    /// Writing through this does not mark the frame dirty; the holder
    /// declares that when unpinning.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// The resident page, or [`PageId::INVALID`] if the frame is free.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId(self.page_id.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.0, Ordering::Release);
    }

    #[inline]
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the pin count, returning the new count.
    ///
    /// Returns `None` and leaves the count alone if it is already zero.
    #[inline]
    pub(crate) fn unpin(&self) -> Option<u32> {
        self.pin_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .ok()
            .map(|old| old - 1)
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    #[inline]
    pub(crate) fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn clear_dirty(&self) {
        self.is_dirty.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// Zero the page and return the frame to its free state.
    pub(crate) fn reset(&self) {
        self.write().reset();
        self.set_page_id(PageId::INVALID);
        self.pin_count.store(0, Ordering::Release);
        self.clear_dirty();
    }

    /// Install `page_id` with a single pin and a clean dirty flag.
    pub(crate) fn assign(&self, page_id: PageId) {
        self.set_page_id(page_id);
        self.pin_count.store(1, Ordering::Release);
        self.clear_dirty();
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new();
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
        assert_eq!(frame.pin_count(), 0);
        assert_eq!(frame.page_id(), PageId::INVALID);
    }

    #[test]
    fn test_frame_pin_unpin() {
        let frame = Frame::new();

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert_eq!(frame.unpin(), Some(1));
        assert!(frame.is_pinned());
        assert_eq!(frame.unpin(), Some(0));
        assert!(!frame.is_pinned());
    }

    #[test]
    fn test_frame_unpin_at_zero_reports() {
        let frame = Frame::new();
        assert_eq!(frame.unpin(), None);
        assert_eq!(frame.pin_count(), 0);
    }

    #[test]
    fn test_frame_assign_and_reset() {
        let frame = Frame::new();
        frame.assign(PageId::new(99));
        frame.mark_dirty();
        frame.write().as_mut_slice()[100] = 0xFF;

        assert_eq!(frame.page_id(), PageId::new(99));
        assert_eq!(frame.pin_count(), 1);

        frame.reset();

        assert_eq!(frame.page_id(), PageId::INVALID);
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
        assert_eq!(frame.read().as_slice()[100], 0);
    }

    #[test]
    fn test_frame_concurrent_pin_unpin() {
        use std::sync::Arc;
        use std::thread;

        let frame = Arc::new(Frame::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let frame = Arc::clone(&frame);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    frame.pin();
                    assert!(frame.unpin().is_some());
                }
                frame.pin();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(frame.pin_count(), 8);
    }
}
