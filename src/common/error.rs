//! Error types for bucketdb.

use thiserror::Error;

use crate::storage::page::PageType;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in bucketdb.
///
/// Outcomes that are part of normal control flow (a duplicate insert, a
/// remove of an absent pair, unpinning a page that is not pinned) are
/// reported through `bool` results instead of this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the disk manager.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every frame in the pool is pinned, so nothing can be evicted.
    ///
    /// Recoverable: retry after other holders release their pins.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The hash directory is at its maximum depth and cannot double.
    #[error("Hash directory is full at global depth {0}")]
    DirectoryFull(u32),

    /// The page ID is the sentinel or otherwise unusable.
    #[error("Invalid page ID: {0}")]
    InvalidPageId(i32),

    /// A typed view was requested over a page carrying another tag.
    #[error("Page {page_id} has type {found:?}, expected {expected:?}")]
    PageTypeMismatch {
        page_id: i32,
        expected: PageType,
        found: PageType,
    },

    /// A bucket page records a slot count its key/value layout cannot hold.
    #[error("Bucket page {page_id} has capacity {capacity}, at most {max} fits")]
    BucketCapacity {
        page_id: i32,
        capacity: usize,
        max: usize,
    },

    /// Stored checksum does not match the page contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(i32),
}

impl Error {
    /// Whether this error signals resource exhaustion.
    ///
    /// Exhaustion is never fatal; the caller owns the retry policy.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Error::NoFreeFrames | Error::DirectoryFull(_))
    }
}
