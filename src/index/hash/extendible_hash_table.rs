//! Disk-backed extendible hash table.
//!
//! # Structure
//! ```text
//!   directory page (global depth 2)            bucket pages
//!   ┌──────┬─────────────┬───────┐
//!   │ slot │ local depth │ page  │         ┌──────────────┐
//!   ├──────┼─────────────┼───────┤    ┌───▶│ bucket A (2) │
//!   │  00  │      2      │   A   │────┘    └──────────────┘
//!   │  01  │      1      │   B   │────┐    ┌──────────────┐
//!   │  10  │      2      │   C   │──┐ ├───▶│ bucket B (1) │
//!   │  11  │      1      │   B   │──┼─┘    └──────────────┘
//!   └──────┴─────────────┴───────┘  │      ┌──────────────┐
//!                                   └─────▶│ bucket C (2) │
//!                                          └──────────────┘
//! ```
//!
//! # Latching
//! A table-wide `RwLock` guards the directory's shape. Lookups, and inserts
//! or removes that fit in their bucket, hold it shared and latch only the
//! one bucket page they touch. Splits and merges retake it exclusively and
//! re-check their precondition before changing anything.

use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use super::hash_function::KeyHasher;
use crate::buffer::{BufferPool, PageReadGuard, PageWriteGuard};
use crate::common::config::HASH_INITIAL_GLOBAL_DEPTH;
use crate::common::{Error, KeyComparator, PageId, Result, Storable};
use crate::storage::page::{
    max_bucket_capacity, BucketStats, HashTableBucketPage, HashTableDirectoryPage,
};

type DirectoryRead<'a> = HashTableDirectoryPage<PageReadGuard<'a>>;
type DirectoryWrite<'a> = HashTableDirectoryPage<PageWriteGuard<'a>>;
type BucketRead<'a, K, V> = HashTableBucketPage<PageReadGuard<'a>, K, V>;
type BucketWrite<'a, K, V> = HashTableBucketPage<PageWriteGuard<'a>, K, V>;

/// Extendible hash table mapping `K` to one or more `V`s.
///
/// Keys may repeat with different values; an exact `(key, value)` pair is
/// stored at most once. Keys are matched with the injected comparator and
/// placed with the injected hasher, which must agree on equality.
///
/// Every page the table fetches is unpinned before the operation returns,
/// on error paths included.
pub struct ExtendibleHashTable<K, V, P, C, H> {
    bpm: Arc<P>,
    directory_page_id: PageId,
    comparator: C,
    hasher: H,
    bucket_capacity: usize,
    table_latch: RwLock<()>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, P, C, H> ExtendibleHashTable<K, V, P, C, H>
where
    K: Storable,
    V: Storable + PartialEq,
    P: BufferPool,
    C: KeyComparator<K>,
    H: KeyHasher<K>,
{
    /// Create a table whose buckets fill a whole page.
    pub fn new(bpm: Arc<P>, comparator: C, hasher: H) -> Result<Self> {
        Self::with_bucket_capacity(bpm, comparator, hasher, max_bucket_capacity::<K, V>())
    }

    /// Create a table with `bucket_capacity` slots per bucket.
    ///
    /// The directory starts at the initial global depth with one bucket
    /// per slot.
    ///
    /// # Panics
    /// Panics if `bucket_capacity` is 0 or does not fit in a page.
    pub fn with_bucket_capacity(
        bpm: Arc<P>,
        comparator: C,
        hasher: H,
        bucket_capacity: usize,
    ) -> Result<Self> {
        let directory_page_id = {
            let guard = bpm.new_page_write()?;
            let page_id = guard.page_id();
            let mut dir = HashTableDirectoryPage::init(guard, page_id);

            for _ in 0..HASH_INITIAL_GLOBAL_DEPTH {
                dir.incr_global_depth()?;
            }
            for idx in 0..dir.size() {
                let bucket_guard = bpm.new_page_write()?;
                let bucket_page_id = bucket_guard.page_id();
                HashTableBucketPage::<_, K, V>::init(bucket_guard, bucket_page_id, bucket_capacity)
                    .seal();
                dir.set_bucket_page_id(idx, bucket_page_id);
                dir.set_local_depth(idx, HASH_INITIAL_GLOBAL_DEPTH);
            }
            dir.seal();
            page_id
        };

        debug!(
            "created hash table with directory {} and bucket capacity {}",
            directory_page_id, bucket_capacity
        );

        Ok(Self {
            bpm,
            directory_page_id,
            comparator,
            hasher,
            bucket_capacity,
            table_latch: RwLock::new(()),
            _marker: PhantomData,
        })
    }

    /// Re-attach to a table whose directory lives at `directory_page_id`.
    ///
    /// # Errors
    /// - `Error::PageTypeMismatch` if that page is not a hash directory
    /// - `Error::BucketCapacity` if the stored buckets cannot hold `K`/`V`
    ///   slots
    pub fn open(bpm: Arc<P>, directory_page_id: PageId, comparator: C, hasher: H) -> Result<Self> {
        let first_bucket = {
            let guard = bpm.fetch_page_read(directory_page_id)?;
            HashTableDirectoryPage::new(guard)?.bucket_page_id(0)
        };
        let bucket_capacity = {
            let guard = bpm.fetch_page_read(first_bucket)?;
            HashTableBucketPage::<_, K, V>::new(guard)?.capacity()
        };

        Ok(Self {
            bpm,
            directory_page_id,
            comparator,
            hasher,
            bucket_capacity,
            table_latch: RwLock::new(()),
            _marker: PhantomData,
        })
    }

    pub fn directory_page_id(&self) -> PageId {
        self.directory_page_id
    }

    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    pub fn buffer_pool(&self) -> &Arc<P> {
        &self.bpm
    }

    // ========================================================================
    // Page access
    // ========================================================================

    #[inline]
    fn hash(&self, key: &K) -> u32 {
        self.hasher.hash(key)
    }

    fn fetch_directory(&self) -> Result<DirectoryRead<'_>> {
        HashTableDirectoryPage::new(self.bpm.fetch_page_read(self.directory_page_id)?)
    }

    fn fetch_directory_mut(&self) -> Result<DirectoryWrite<'_>> {
        HashTableDirectoryPage::new(self.bpm.fetch_page_write(self.directory_page_id)?)
    }

    fn fetch_bucket(&self, page_id: PageId) -> Result<BucketRead<'_, K, V>> {
        HashTableBucketPage::new(self.bpm.fetch_page_read(page_id)?)
    }

    fn fetch_bucket_mut(&self, page_id: PageId) -> Result<BucketWrite<'_, K, V>> {
        HashTableBucketPage::new(self.bpm.fetch_page_write(page_id)?)
    }

    /// Bucket page currently responsible for `key`. The directory is
    /// unpinned again before returning.
    fn key_to_page_id(&self, key: &K) -> Result<PageId> {
        let dir = self.fetch_directory()?;
        Ok(dir.bucket_page_id(dir.hash_to_index(self.hash(key))))
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// All values stored under `key`.
    pub fn get_value(&self, key: &K) -> Result<Vec<V>> {
        let _latch = self.table_latch.read();
        let bucket = self.fetch_bucket(self.key_to_page_id(key)?)?;
        Ok(bucket.get_value(key, &self.comparator))
    }

    /// Insert `(key, value)`, splitting buckets as needed.
    ///
    /// Returns `Ok(false)` if the pair is already stored.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if the pool cannot supply a page
    /// - `Error::DirectoryFull` if the target bucket keeps overflowing at
    ///   the maximum directory depth
    pub fn insert(&self, key: &K, value: &V) -> Result<bool> {
        {
            let _latch = self.table_latch.read();
            let mut bucket = self.fetch_bucket_mut(self.key_to_page_id(key)?)?;

            if !bucket.is_full() {
                let inserted = bucket.insert(key, value, &self.comparator);
                bucket.seal();
                return Ok(inserted);
            }
            if bucket.contains(key, value, &self.comparator) {
                return Ok(false);
            }
        }

        self.split_insert(key, value)
    }

    fn split_insert(&self, key: &K, value: &V) -> Result<bool> {
        let _latch = self.table_latch.write();

        loop {
            let mut dir = self.fetch_directory_mut()?;
            let idx = dir.hash_to_index(self.hash(key));
            let bucket_page_id = dir.bucket_page_id(idx);
            let mut bucket = self.fetch_bucket_mut(bucket_page_id)?;

            // Someone may have split or drained it while we waited.
            if bucket.contains(key, value, &self.comparator) {
                return Ok(false);
            }
            if !bucket.is_full() {
                let inserted = bucket.insert(key, value, &self.comparator);
                bucket.seal();
                dir.seal();
                return Ok(inserted);
            }

            let local_depth = dir.local_depth(idx);
            if local_depth == dir.global_depth() {
                dir.incr_global_depth()?;
                // a doubled directory is valid on its own if allocation fails
                dir.seal();
            }

            let image_guard = self.bpm.new_page_write()?;
            let image_page_id = image_guard.page_id();
            let mut image = HashTableBucketPage::<_, K, V>::init(
                image_guard,
                image_page_id,
                self.bucket_capacity,
            );

            let split_bit = 1usize << local_depth;
            for slot in 0..dir.size() {
                if dir.bucket_page_id(slot) == bucket_page_id {
                    dir.set_local_depth(slot, local_depth + 1);
                    if slot & split_bit != 0 {
                        dir.set_bucket_page_id(slot, image_page_id);
                    }
                }
            }

            let entries = bucket.entries();
            bucket.clear();
            for (k, v) in &entries {
                let moved = if self.hash(k) as usize & split_bit != 0 {
                    image.insert(k, v, &self.comparator)
                } else {
                    bucket.insert(k, v, &self.comparator)
                };
                debug_assert!(moved, "split lost an entry");
            }

            bucket.seal();
            image.seal();
            dir.seal();

            debug!(
                "split {} at local depth {}, image {} took {} of {} entries",
                bucket_page_id,
                local_depth,
                image_page_id,
                image.num_readable(),
                entries.len()
            );
        }
    }

    /// Remove `(key, value)`, merging its bucket away if it empties.
    ///
    /// Returns `Ok(false)` if the pair is not stored.
    pub fn remove(&self, key: &K, value: &V) -> Result<bool> {
        let emptied = {
            let _latch = self.table_latch.read();
            let mut bucket = self.fetch_bucket_mut(self.key_to_page_id(key)?)?;

            if !bucket.remove(key, value, &self.comparator) {
                return Ok(false);
            }
            bucket.seal();
            bucket.is_empty()
        };

        if emptied {
            self.merge(key)?;
        }
        Ok(true)
    }

    /// Fold the empty bucket holding `key`'s slot into its split image,
    /// then shrink the directory as far as it will go.
    fn merge(&self, key: &K) -> Result<()> {
        let _latch = self.table_latch.write();

        let emptied_page_id = {
            let mut dir = self.fetch_directory_mut()?;
            let idx = dir.hash_to_index(self.hash(key));
            let local_depth = dir.local_depth(idx);
            if local_depth == 0 {
                return Ok(());
            }

            let bucket_page_id = dir.bucket_page_id(idx);
            let image_idx = dir.split_image_index(idx);
            let image_page_id = dir.bucket_page_id(image_idx);
            if dir.local_depth(image_idx) != local_depth || image_page_id == bucket_page_id {
                return Ok(());
            }
            if !self.fetch_bucket(bucket_page_id)?.is_empty() {
                return Ok(());
            }

            for slot in 0..dir.size() {
                let page_id = dir.bucket_page_id(slot);
                if page_id == bucket_page_id || page_id == image_page_id {
                    dir.set_bucket_page_id(slot, image_page_id);
                    dir.set_local_depth(slot, local_depth - 1);
                }
            }
            while dir.can_shrink() {
                dir.decr_global_depth();
            }
            dir.seal();

            debug!(
                "merged {} into {} at local depth {}",
                bucket_page_id,
                image_page_id,
                local_depth - 1
            );
            bucket_page_id
        };

        if !self.bpm.delete_page(emptied_page_id)? {
            warn!("merged bucket {} is still pinned, not deleted", emptied_page_id);
        }
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn global_depth(&self) -> Result<u32> {
        let _latch = self.table_latch.read();
        Ok(self.fetch_directory()?.global_depth())
    }

    /// Occupancy of the bucket `key` hashes to.
    pub fn bucket_stats(&self, key: &K) -> Result<BucketStats> {
        let _latch = self.table_latch.read();
        Ok(self.fetch_bucket(self.key_to_page_id(key)?)?.stats())
    }

    /// Dump the directory at debug level.
    pub fn log_directory(&self) -> Result<()> {
        let _latch = self.table_latch.read();
        self.fetch_directory()?.log_directory();
        Ok(())
    }

    /// Check the directory invariants and every page checksum.
    ///
    /// # Errors
    /// `Error::ChecksumMismatch` naming the first corrupt page.
    ///
    /// # Panics
    /// Panics if the directory's structural invariants do not hold.
    pub fn verify_integrity(&self) -> Result<()> {
        let _latch = self.table_latch.read();

        let guard = self.bpm.fetch_page_read(self.directory_page_id)?;
        if !guard.verify_checksum() {
            return Err(Error::ChecksumMismatch(self.directory_page_id.0));
        }
        let dir = HashTableDirectoryPage::new(guard)?;
        dir.verify_integrity();

        let mut bucket_ids: Vec<PageId> = (0..dir.size()).map(|idx| dir.bucket_page_id(idx)).collect();
        bucket_ids.sort_unstable();
        bucket_ids.dedup();
        drop(dir);

        for page_id in bucket_ids {
            let guard = self.bpm.fetch_page_read(page_id)?;
            if !guard.verify_checksum() {
                return Err(Error::ChecksumMismatch(page_id.0));
            }
            HashTableBucketPage::<_, K, V>::new(guard)?;
        }
        Ok(())
    }
}
