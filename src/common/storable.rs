//! Fixed-width encoding for values stored inside pages.

/// A value with a fixed on-page width.
///
/// Bucket pages lay keys and values out in a flat slot array, so every
/// key and value type must encode to exactly [`Storable::SIZE`] bytes.
pub trait Storable: Sized + Clone + Send + Sync {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Write the encoding into `buf[..Self::SIZE]`.
    fn write_to(&self, buf: &mut [u8]);

    /// Decode from `buf[..Self::SIZE]`.
    fn read_from(buf: &[u8]) -> Self;
}

macro_rules! impl_storable_for_int {
    ($($ty:ty),*) => {
        $(
            impl Storable for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_to(&self, buf: &mut [u8]) {
                    buf[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(&buf[..Self::SIZE]);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_storable_for_int!(i32, i64, u32, u64);
