//! Page identifier type.

use std::fmt;

/// Identifies a logical page on disk.
///
/// Signed so that the sentinel [`PageId::INVALID`] (-1) can be stored in
/// page images next to real ids. Valid ids are non-negative; in a sharded
/// pool `id % num_instances` names the owning shard.
///
/// # Example
/// ```
/// use bucketdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub i32);

impl PageId {
    /// Invalid/sentinel page ID.
    pub const INVALID: PageId = PageId(-1);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: i32) -> Self {
        PageId(id)
    }

    /// Check if this page ID names a real page.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// Byte offset of this page in a single-file layout.
    #[inline]
    pub(crate) fn file_offset(&self, page_size: usize) -> u64 {
        (self.0 as u64) * (page_size as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Page({})", self.0)
        } else {
            write!(f, "Page(INVALID)")
        }
    }
}
