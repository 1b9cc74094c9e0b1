//! Extendible hash bucket page.
//!
//! A bucket stores `(key, value)` pairs in a fixed array of slots, with
//! two bitmaps tracking slot state:
//!
//! | Occupied | Readable | Meaning                         |
//! |----------|----------|---------------------------------|
//! |    0     |    0     | Never used                      |
//! |    1     |    1     | Live entry                      |
//! |    1     |    0     | Tombstone left by a removal     |
//!
//! Slots are claimed strictly left to right, so a scan can stop at the
//! first slot that was never occupied.
//!
//! # Layout
//! ```text
//! Offset            Size          Field
//! ------            ----          -----
//! 0                 16            PageHeader (type = HashBucket)
//! 16                4             capacity (u32)
//! 20                12            reserved
//! 32                ceil(c/8)     occupied bitmap
//! 32 + ceil(c/8)    ceil(c/8)     readable bitmap
//! 32 + 2*ceil(c/8)  c * (K + V)   slot array
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, KeyComparator, PageId, Result, Storable};

use super::page::Page;
use super::page_header::{PageHeader, PageType};

const OFFSET_CAPACITY: usize = PageHeader::SIZE;
const OFFSET_BITMAPS: usize = 32;

#[inline]
fn bitmap_len(capacity: usize) -> usize {
    (capacity + 7) / 8
}

#[inline]
fn layout_size(capacity: usize, slot_size: usize) -> usize {
    OFFSET_BITMAPS + 2 * bitmap_len(capacity) + capacity * slot_size
}

/// Largest number of `(K, V)` slots a bucket page can hold.
///
/// Each slot costs its encoded width plus two bits of bitmap.
pub fn max_bucket_capacity<K: Storable, V: Storable>() -> usize {
    let slot_size = K::SIZE + V::SIZE;
    let mut capacity = 4 * (PAGE_SIZE - OFFSET_BITMAPS) / (4 * slot_size + 1);
    while layout_size(capacity, slot_size) > PAGE_SIZE {
        capacity -= 1;
    }
    capacity
}

/// Occupancy summary of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStats {
    /// Total slots.
    pub capacity: usize,
    /// Slots ever occupied.
    pub size: usize,
    /// Live entries.
    pub taken: usize,
    /// Tombstones.
    pub free: usize,
}

impl fmt::Display for BucketStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bucket Capacity: {}, Size: {}, Taken: {}, Free: {}",
            self.capacity, self.size, self.taken, self.free
        )
    }
}

/// Typed view of a bucket page holding `K` keys and `V` values.
pub struct HashTableBucketPage<P, K, V> {
    page: P,
    capacity: usize,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<P, K, V> HashTableBucketPage<P, K, V>
where
    P: Deref<Target = Page>,
    K: Storable,
    V: Storable + PartialEq,
{
    /// Wrap a page that already holds a bucket.
    pub fn new(page: P) -> Result<Self> {
        page.expect_type(PageType::HashBucket)?;
        let capacity = u32::read_from(&page.as_slice()[OFFSET_CAPACITY..]) as usize;
        let max = max_bucket_capacity::<K, V>();
        if capacity == 0 || capacity > max {
            return Err(Error::BucketCapacity {
                page_id: page.header().page_id,
                capacity,
                max,
            });
        }
        Ok(Self {
            page,
            capacity,
            _marker: PhantomData,
        })
    }

    pub fn page_id(&self) -> PageId {
        PageId::new(self.page.header().page_id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn readable_offset(&self) -> usize {
        OFFSET_BITMAPS + bitmap_len(self.capacity)
    }

    #[inline]
    fn slot_offset(&self, idx: usize) -> usize {
        OFFSET_BITMAPS + 2 * bitmap_len(self.capacity) + idx * (K::SIZE + V::SIZE)
    }

    #[inline]
    fn bit(&self, base: usize, idx: usize) -> bool {
        self.page.as_slice()[base + idx / 8] & (1 << (idx % 8)) != 0
    }

    pub fn is_occupied(&self, idx: usize) -> bool {
        self.bit(OFFSET_BITMAPS, idx)
    }

    pub fn is_readable(&self, idx: usize) -> bool {
        self.bit(self.readable_offset(), idx)
    }

    pub fn key_at(&self, idx: usize) -> K {
        K::read_from(&self.page.as_slice()[self.slot_offset(idx)..])
    }

    pub fn value_at(&self, idx: usize) -> V {
        V::read_from(&self.page.as_slice()[self.slot_offset(idx) + K::SIZE..])
    }

    /// Slot indexes worth scanning: everything before the first never-used slot.
    fn scan_len(&self) -> usize {
        (0..self.capacity)
            .find(|&idx| !self.is_occupied(idx))
            .unwrap_or(self.capacity)
    }

    /// All values stored under `key`.
    pub fn get_value<C: KeyComparator<K>>(&self, key: &K, cmp: &C) -> Vec<V> {
        (0..self.scan_len())
            .filter(|&idx| self.is_readable(idx))
            .filter(|&idx| cmp.compare(key, &self.key_at(idx)) == Ordering::Equal)
            .map(|idx| self.value_at(idx))
            .collect()
    }

    /// Whether the exact `(key, value)` pair is live in this bucket.
    pub fn contains<C: KeyComparator<K>>(&self, key: &K, value: &V, cmp: &C) -> bool {
        self.find(key, value, cmp).is_some()
    }

    fn find<C: KeyComparator<K>>(&self, key: &K, value: &V, cmp: &C) -> Option<usize> {
        (0..self.scan_len()).find(|&idx| {
            self.is_readable(idx)
                && cmp.compare(key, &self.key_at(idx)) == Ordering::Equal
                && self.value_at(idx) == *value
        })
    }

    /// Live `(key, value)` pairs in slot order.
    pub fn entries(&self) -> Vec<(K, V)> {
        (0..self.scan_len())
            .filter(|&idx| self.is_readable(idx))
            .map(|idx| (self.key_at(idx), self.value_at(idx)))
            .collect()
    }

    pub fn num_readable(&self) -> usize {
        let start = self.readable_offset();
        self.page.as_slice()[start..start + bitmap_len(self.capacity)]
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    /// Every slot is occupied and readable (no room, no tombstone to reuse).
    pub fn is_full(&self) -> bool {
        let len = bitmap_len(self.capacity);
        let data = self.page.as_slice();
        let occupied = &data[OFFSET_BITMAPS..OFFSET_BITMAPS + len];
        let readable = &data[OFFSET_BITMAPS + len..OFFSET_BITMAPS + 2 * len];

        let tail_bits = self.capacity % 8;
        let full_bytes = if tail_bits == 0 { len } else { len - 1 };
        if occupied[..full_bytes].iter().any(|&b| b != 0xFF)
            || readable[..full_bytes].iter().any(|&b| b != 0xFF)
        {
            return false;
        }
        if tail_bits != 0 {
            let mask = (1u8 << tail_bits) - 1;
            return occupied[len - 1] & mask == mask && readable[len - 1] & mask == mask;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.num_readable() == 0
    }

    pub fn stats(&self) -> BucketStats {
        let size = self.scan_len();
        let taken = (0..size).filter(|&idx| self.is_readable(idx)).count();
        BucketStats {
            capacity: self.capacity,
            size,
            taken,
            free: size - taken,
        }
    }
}

impl<P, K, V> HashTableBucketPage<P, K, V>
where
    P: DerefMut<Target = Page>,
    K: Storable,
    V: Storable + PartialEq,
{
    /// Format `page` as an empty bucket with `capacity` slots.
    ///
    /// # Panics
    /// Panics if `capacity` is 0 or larger than [`max_bucket_capacity`].
    pub fn init(mut page: P, page_id: PageId, capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity <= max_bucket_capacity::<K, V>(),
            "bucket capacity {} out of range",
            capacity
        );
        page.format(PageType::HashBucket, page_id);
        (capacity as u32).write_to(&mut page.as_mut_slice()[OFFSET_CAPACITY..]);
        Self {
            page,
            capacity,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn set_bit(&mut self, base: usize, idx: usize, on: bool) {
        let byte = &mut self.page.as_mut_slice()[base + idx / 8];
        if on {
            *byte |= 1 << (idx % 8);
        } else {
            *byte &= !(1 << (idx % 8));
        }
    }

    fn set_occupied(&mut self, idx: usize) {
        self.set_bit(OFFSET_BITMAPS, idx, true);
    }

    fn set_readable(&mut self, idx: usize) {
        let base = self.readable_offset();
        self.set_bit(base, idx, true);
    }

    /// Tombstone slot `idx`: it stays occupied but is no longer readable.
    pub fn remove_at(&mut self, idx: usize) {
        let base = self.readable_offset();
        self.set_bit(base, idx, false);
    }

    /// Insert `(key, value)` into the first never-used or tombstoned slot.
    ///
    /// Returns `false` if the pair is already present or the bucket is full.
    pub fn insert<C: KeyComparator<K>>(&mut self, key: &K, value: &V, cmp: &C) -> bool {
        let scan_len = self.scan_len();
        let mut target = None;
        for idx in 0..scan_len {
            if !self.is_readable(idx) {
                target.get_or_insert(idx);
            } else if cmp.compare(key, &self.key_at(idx)) == Ordering::Equal
                && self.value_at(idx) == *value
            {
                return false;
            }
        }

        let idx = match target {
            Some(idx) => idx,
            None if scan_len < self.capacity => scan_len,
            None => return false,
        };

        let offset = self.slot_offset(idx);
        let data = self.page.as_mut_slice();
        key.write_to(&mut data[offset..offset + K::SIZE]);
        value.write_to(&mut data[offset + K::SIZE..offset + K::SIZE + V::SIZE]);
        self.set_occupied(idx);
        self.set_readable(idx);
        true
    }

    /// Tombstone the slot holding `(key, value)`; `false` if absent.
    pub fn remove<C: KeyComparator<K>>(&mut self, key: &K, value: &V, cmp: &C) -> bool {
        match self.find(key, value, cmp) {
            Some(idx) => {
                self.remove_at(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every entry and tombstone, keeping the capacity.
    pub fn clear(&mut self) {
        let end = self.slot_offset(0);
        self.page.as_mut_slice()[OFFSET_BITMAPS..end].fill(0);
    }

    /// Stamp the checksum once a batch of edits is done.
    pub fn seal(&mut self) {
        self.page.update_checksum();
    }
}
