//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw byte array that serves as the unit of I/O between
//! disk and memory. Pages live inside [`Frame`](crate::buffer::Frame)s in
//! the buffer pool and are never copied out of them in production code.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};

use super::page_header::{PageHeader, PageType};

/// A page of data (4KB, 4KB-aligned).
///
/// The same buffer is read as a generic data page, a hash directory or a
/// hash bucket depending on what the caller asked for; typed pages record
/// their kind in a [`PageHeader`] so a mismatch is caught instead of
/// silently reinterpreted.
///
/// `Page` does not implement `Clone` outside tests so that copying 4KB
/// stays explicit.
///
/// # Example
/// ```
/// use bucketdb::storage::page::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
#[derive(Debug)]
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// The type tag stored in the header.
    pub fn page_type(&self) -> PageType {
        self.header().page_type
    }

    /// Zero the page and stamp a header for a typed page.
    pub fn format(&mut self, page_type: PageType, page_id: PageId) {
        self.reset();
        PageHeader::new(page_type, page_id.0).write_to(&mut self.data);
    }

    /// Fail unless the header carries `expected`.
    pub fn expect_type(&self, expected: PageType) -> Result<()> {
        let header = self.header();
        if header.page_type != expected {
            return Err(Error::PageTypeMismatch {
                page_id: header.page_id,
                expected,
                found: header.page_type,
            });
        }
        Ok(())
    }

    /// Compute and store the checksum in the header.
    ///
    /// Call this after all modifications to a typed page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        self.data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}
