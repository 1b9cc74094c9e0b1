//! Key capabilities for indexes: fixed-width byte keys and comparators.

use std::cmp::Ordering;
use std::fmt;

use super::storable::Storable;

/// Three-way key comparison injected into an index.
///
/// `Ordering::Equal` means the keys are the same key. It must agree with
/// the index's hash function: equal keys hash equally.
pub trait KeyComparator<K>: Send + Sync {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

impl<K, F> KeyComparator<K> for F
where
    F: Fn(&K, &K) -> Ordering + Send + Sync,
{
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        self(lhs, rhs)
    }
}

/// Compares keys through their `Ord` implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrdComparator;

impl<K: Ord> KeyComparator<K> for OrdComparator {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// An opaque key of exactly `N` bytes.
///
/// Index keys built from tuple columns are serialized into one of these
/// (4, 8, 16, 32 or 64 bytes is typical) so the bucket slot width is
/// known up front.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericKey<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> GenericKey<N> {
    pub fn new(data: [u8; N]) -> Self {
        Self { data }
    }

    /// Build a key from an integer, zero padded (or truncated) to `N` bytes.
    pub fn from_integer(value: i64) -> Self {
        let mut data = [0u8; N];
        let bytes = value.to_le_bytes();
        let len = N.min(bytes.len());
        data[..len].copy_from_slice(&bytes[..len]);
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl<const N: usize> Default for GenericKey<N> {
    fn default() -> Self {
        Self { data: [0u8; N] }
    }
}

impl<const N: usize> fmt::Debug for GenericKey<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericKey<{}>(", N)?;
        for byte in &self.data {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl<const N: usize> Storable for GenericKey<N> {
    const SIZE: usize = N;

    fn write_to(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(&self.data);
    }

    fn read_from(buf: &[u8]) -> Self {
        let mut data = [0u8; N];
        data.copy_from_slice(&buf[..N]);
        Self { data }
    }
}

/// Byte-wise lexicographic comparison of [`GenericKey`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericComparator;

impl<const N: usize> KeyComparator<GenericKey<N>> for GenericComparator {
    fn compare(&self, lhs: &GenericKey<N>, rhs: &GenericKey<N>) -> Ordering {
        lhs.data.cmp(&rhs.data)
    }
}
