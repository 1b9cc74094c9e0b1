//! Hash functions for the extendible hash index.

use std::hash::Hash;

use ahash::RandomState;

/// 32-bit hash of an index key.
///
/// Must agree with the index's comparator: keys that compare equal hash
/// equally. The low bits select the directory slot, so they should be
/// well mixed.
pub trait KeyHasher<K>: Send + Sync {
    fn hash(&self, key: &K) -> u32;
}

impl<K, F> KeyHasher<K> for F
where
    F: Fn(&K) -> u32 + Send + Sync,
{
    #[inline]
    fn hash(&self, key: &K) -> u32 {
        self(key)
    }
}

// Fixed so that a table reopened from disk hashes keys to the same slots.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// `ahash` with fixed seeds, truncated to 32 bits.
#[derive(Clone)]
pub struct DefaultKeyHasher {
    state: RandomState,
}

impl DefaultKeyHasher {
    pub fn new() -> Self {
        Self {
            state: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }
}

impl Default for DefaultKeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash> KeyHasher<K> for DefaultKeyHasher {
    #[inline]
    fn hash(&self, key: &K) -> u32 {
        self.state.hash_one(key) as u32
    }
}
