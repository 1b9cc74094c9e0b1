//! In-memory disk manager, mostly for tests and benchmarks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{PageId, Result};

use super::disk_manager::{check_page_id, DiskManager};

/// Keeps every written page in a hash map and counts I/O calls.
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<[u8]>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read_page` calls served.
    pub fn num_reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write_page` calls served.
    pub fn num_writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Whether the page has been written and not deallocated.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.pages.lock().contains_key(&page_id)
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        check_page_id(page_id)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        match self.pages.lock().get(&page_id) {
            Some(data) => buf[..PAGE_SIZE].copy_from_slice(data),
            None => buf[..PAGE_SIZE].fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<()> {
        check_page_id(page_id)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        self.pages
            .lock()
            .insert(page_id, buf[..PAGE_SIZE].to_vec().into_boxed_slice());
        Ok(())
    }

    fn num_pages(&self) -> u32 {
        self.pages
            .lock()
            .keys()
            .map(|page_id| page_id.0 as u32 + 1)
            .max()
            .unwrap_or(0)
    }

    fn deallocate_page(&self, page_id: PageId) -> Result<()> {
        self.pages.lock().remove(&page_id);
        Ok(())
    }
}
