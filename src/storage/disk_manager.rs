//! Disk Manager - block I/O for database pages.
//!
//! The buffer pool only ever talks to disk through the [`DiskManager`]
//! trait: read or write one `PAGE_SIZE` block by page id. Page ids are
//! handed out by the buffer pool itself, so the disk layer never allocates.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::trace;
use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};

/// Fixed-size block storage addressed by page id.
///
/// Implementations are shared by every shard of a buffer pool, so all
/// methods take `&self` and synchronize internally. Reads and writes are
/// synchronous and considered durable once they return.
pub trait DiskManager: Send + Sync {
    /// Fill `buf` (exactly `PAGE_SIZE` bytes) with the page's contents.
    ///
    /// A page that was never written reads as zeros.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<()>;

    /// Persist `buf` (exactly `PAGE_SIZE` bytes) as the page's contents.
    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<()>;

    /// One past the highest page id that has storage behind it.
    ///
    /// A pool opened over existing data starts allocating from here.
    fn num_pages(&self) -> u32 {
        0
    }

    /// Release the page's storage. The default keeps the block in place.
    fn deallocate_page(&self, _page_id: PageId) -> Result<()> {
        Ok(())
    }

    /// Force buffered writes down to stable storage.
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn check_page_id(page_id: PageId) -> Result<()> {
    if page_id.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidPageId(page_id.0))
    }
}

/// Disk manager over a single database file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Sharded pools hand out interleaved ids, so the file may have holes;
/// they read back as zeros.
pub struct FileDiskManager {
    inner: Mutex<FileState>,
}

struct FileState {
    file: File,
    len: u64,
}

impl FileDiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self::from_file(file, 0))
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self::from_file(file, len))
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn from_file(file: File, len: u64) -> Self {
        Self {
            inner: Mutex::new(FileState { file, len }),
        }
    }

    /// Size of the database file in bytes.
    pub fn file_size(&self) -> u64 {
        self.inner.lock().len
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        check_page_id(page_id)?;
        let offset = page_id.file_offset(PAGE_SIZE);
        let mut state = self.inner.lock();

        if offset + PAGE_SIZE as u64 > state.len {
            trace!("read of {} past end of file, zero filling", page_id);
            buf[..PAGE_SIZE].fill(0);
            return Ok(());
        }

        state.file.seek(SeekFrom::Start(offset))?;
        state.file.read_exact(&mut buf[..PAGE_SIZE])?;
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<()> {
        check_page_id(page_id)?;
        let offset = page_id.file_offset(PAGE_SIZE);
        let mut state = self.inner.lock();

        state.file.seek(SeekFrom::Start(offset))?;
        state.file.write_all(&buf[..PAGE_SIZE])?;
        state.len = state.len.max(offset + PAGE_SIZE as u64);
        Ok(())
    }

    fn num_pages(&self) -> u32 {
        (self.inner.lock().len / PAGE_SIZE as u64) as u32
    }

    fn sync(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }
}
