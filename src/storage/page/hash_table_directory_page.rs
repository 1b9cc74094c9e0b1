//! Extendible hash directory page.
//!
//! The directory maps the low `global_depth` bits of a key's hash to the
//! bucket page holding it. Several slots share a bucket while that
//! bucket's local depth is below the global depth.
//!
//! # Layout
//! ```text
//! Offset  Size   Field
//! ------  -----  -----
//! 0       16     PageHeader (type = HashDirectory)
//! 16      4      global_depth (u32)
//! 20      12     reserved
//! 32      512    local_depths (u8 per slot)
//! 544     2048   bucket_page_ids (i32 per slot)
//! ```

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use log::{debug, info};

use crate::common::config::{HASH_DIRECTORY_ARRAY_SIZE, HASH_DIRECTORY_MAX_DEPTH};
use crate::common::{Error, PageId, Result, Storable};

use super::page::Page;
use super::page_header::{PageHeader, PageType};

const OFFSET_GLOBAL_DEPTH: usize = PageHeader::SIZE;
const OFFSET_LOCAL_DEPTHS: usize = 32;
const OFFSET_BUCKET_PAGE_IDS: usize = OFFSET_LOCAL_DEPTHS + HASH_DIRECTORY_ARRAY_SIZE;

/// Typed view of a directory page.
///
/// `P` is anything that dereferences to a [`Page`]: a plain reference, a
/// mutable reference, or a buffer pool page guard. Mutators are only
/// available when `P` dereferences mutably.
pub struct HashTableDirectoryPage<P> {
    page: P,
}

impl<P: Deref<Target = Page>> HashTableDirectoryPage<P> {
    /// Wrap a page that already holds a directory.
    pub fn new(page: P) -> Result<Self> {
        page.expect_type(PageType::HashDirectory)?;
        Ok(Self { page })
    }

    pub fn page_id(&self) -> PageId {
        PageId::new(self.page.header().page_id)
    }

    pub fn global_depth(&self) -> u32 {
        u32::read_from(&self.page.as_slice()[OFFSET_GLOBAL_DEPTH..])
    }

    /// Mask selecting the low `global_depth` bits of a hash.
    pub fn global_depth_mask(&self) -> u32 {
        (1u32 << self.global_depth()) - 1
    }

    /// Number of live directory slots (`2^global_depth`).
    pub fn size(&self) -> usize {
        1 << self.global_depth()
    }

    /// Directory slot a hash falls into.
    #[inline]
    pub fn hash_to_index(&self, hash: u32) -> usize {
        (hash & self.global_depth_mask()) as usize
    }

    pub fn local_depth(&self, idx: usize) -> u32 {
        self.page.as_slice()[OFFSET_LOCAL_DEPTHS + idx] as u32
    }

    /// Mask selecting the low `local_depth(idx)` bits.
    pub fn local_depth_mask(&self, idx: usize) -> u32 {
        (1u32 << self.local_depth(idx)) - 1
    }

    pub fn bucket_page_id(&self, idx: usize) -> PageId {
        let offset = OFFSET_BUCKET_PAGE_IDS + idx * i32::SIZE;
        PageId::new(i32::read_from(&self.page.as_slice()[offset..]))
    }

    /// Slot reached by flipping the highest bit that distinguishes the
    /// bucket at `idx` from its merge partner.
    ///
    /// # Panics
    /// Panics if the slot's local depth is 0 (it has no split image).
    pub fn split_image_index(&self, idx: usize) -> usize {
        let local_depth = self.local_depth(idx);
        assert!(local_depth > 0, "bucket at depth 0 has no split image");
        idx ^ (1 << (local_depth - 1))
    }

    /// True when every local depth is strictly below the global depth.
    pub fn can_shrink(&self) -> bool {
        let global_depth = self.global_depth();
        global_depth > 0 && (0..self.size()).all(|idx| self.local_depth(idx) < global_depth)
    }

    /// Check the structural invariants of the directory.
    ///
    /// - every local depth is at most the global depth
    /// - a bucket at local depth `d` is referenced by exactly
    ///   `2^(global_depth - d)` slots, all sharing their low `d` bits
    /// - all slots referencing one bucket agree on its local depth
    ///
    /// # Panics
    /// Panics describing the first violation found.
    pub fn verify_integrity(&self) {
        let global_depth = self.global_depth();
        let size = self.size();
        let mut seen: HashMap<PageId, (usize, u32, usize)> = HashMap::new();

        for idx in 0..size {
            let local_depth = self.local_depth(idx);
            let page_id = self.bucket_page_id(idx);
            assert!(
                local_depth <= global_depth,
                "local depth {} exceeds global depth {} at slot {}",
                local_depth,
                global_depth,
                idx
            );
            assert!(page_id.is_valid(), "slot {} has no bucket", idx);

            let entry = seen.entry(page_id).or_insert((idx, local_depth, 0));
            entry.2 += 1;
            assert_eq!(
                entry.1, local_depth,
                "local depth mismatch between slots {} and {} for {}",
                entry.0, idx, page_id
            );
            let mask = self.local_depth_mask(idx) as usize;
            assert_eq!(
                entry.0 & mask,
                idx & mask,
                "slots {} and {} share {} but differ below bit {}",
                entry.0,
                idx,
                page_id,
                local_depth
            );
        }

        for (page_id, (_, local_depth, count)) in seen {
            let expected = 1usize << (global_depth - local_depth);
            assert_eq!(
                count, expected,
                "{} referenced {} times, expected {}",
                page_id, count, expected
            );
        }
    }

    /// Write the directory table to the debug log.
    pub fn log_directory(&self) {
        debug!(
            "directory {} (global_depth: {}, size: {})",
            self.page_id(),
            self.global_depth(),
            self.size()
        );
        for idx in 0..self.size() {
            debug!(
                "  slot {:>3} -> {} (local_depth: {})",
                idx,
                self.bucket_page_id(idx),
                self.local_depth(idx)
            );
        }
    }
}

impl<P: DerefMut<Target = Page>> HashTableDirectoryPage<P> {
    /// Format `page` as an empty directory of global depth 0.
    pub fn init(mut page: P, page_id: PageId) -> Self {
        page.format(PageType::HashDirectory, page_id);
        let mut dir = Self { page };
        for idx in 0..HASH_DIRECTORY_ARRAY_SIZE {
            dir.set_bucket_page_id(idx, PageId::INVALID);
        }
        dir
    }

    fn set_global_depth(&mut self, global_depth: u32) {
        global_depth.write_to(&mut self.page.as_mut_slice()[OFFSET_GLOBAL_DEPTH..]);
    }

    pub fn set_local_depth(&mut self, idx: usize, local_depth: u32) {
        debug_assert!(local_depth <= HASH_DIRECTORY_MAX_DEPTH);
        self.page.as_mut_slice()[OFFSET_LOCAL_DEPTHS + idx] = local_depth as u8;
    }

    pub fn set_bucket_page_id(&mut self, idx: usize, page_id: PageId) {
        let offset = OFFSET_BUCKET_PAGE_IDS + idx * i32::SIZE;
        page_id.0.write_to(&mut self.page.as_mut_slice()[offset..]);
    }

    /// Double the directory, copying every slot into the new upper half.
    ///
    /// # Errors
    /// `Error::DirectoryFull` when already at the maximum depth.
    pub fn incr_global_depth(&mut self) -> Result<()> {
        let global_depth = self.global_depth();
        if global_depth >= HASH_DIRECTORY_MAX_DEPTH {
            return Err(Error::DirectoryFull(global_depth));
        }

        let old_size = self.size();
        for idx in 0..old_size {
            let page_id = self.bucket_page_id(idx);
            let local_depth = self.local_depth(idx);
            self.set_bucket_page_id(idx + old_size, page_id);
            self.set_local_depth(idx + old_size, local_depth);
        }
        self.set_global_depth(global_depth + 1);

        info!(
            "directory {} grew to global depth {}",
            self.page_id(),
            global_depth + 1
        );
        Ok(())
    }

    /// Halve the directory, clearing the dropped upper half.
    ///
    /// # Panics
    /// Panics if the global depth is already 0.
    pub fn decr_global_depth(&mut self) {
        let global_depth = self.global_depth();
        assert!(global_depth > 0, "cannot shrink a directory of depth 0");

        let new_size = self.size() / 2;
        for idx in new_size..self.size() {
            self.set_bucket_page_id(idx, PageId::INVALID);
            self.set_local_depth(idx, 0);
        }
        self.set_global_depth(global_depth - 1);

        info!(
            "directory {} shrank to global depth {}",
            self.page_id(),
            global_depth - 1
        );
    }

    /// Stamp the checksum once a batch of edits is done.
    pub fn seal(&mut self) {
        self.page.update_checksum();
    }
}
