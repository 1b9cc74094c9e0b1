//! Page header and type definitions.
//!
//! Typed pages (hash directory, hash bucket) start with a [`PageHeader`]:
//! - [`PageType`] discriminator, so a view can refuse a foreign page
//! - CRC32 checksum over the whole page
//! - the page's own id, so an image can be matched to its slot on disk
//!
//! Generic data pages carry no header; their bytes belong to the caller.

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Zeroed or unrecognised page.
    #[default]
    Invalid = 0,
    /// Extendible hash directory.
    HashDirectory = 2,
    /// Extendible hash bucket.
    HashBucket = 3,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => PageType::HashDirectory,
            3 => PageType::HashBucket,
            _ => PageType::Invalid,
        }
    }
}

/// Metadata stored at the beginning of every typed page.
///
/// # Layout (16 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       4     page_id (i32, little-endian)
/// 9       7     reserved (zero)
/// ```
///
/// The checksum is computed over the entire page with the checksum field
/// itself read as zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
    pub page_id: i32,
}

impl PageHeader {
    /// Size of the header in bytes. Page bodies start here.
    pub const SIZE: usize = 16;

    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_PAGE_ID: usize = 5;

    /// Create a header for a page of the given type; checksum starts at zero.
    pub fn new(page_type: PageType, page_id: i32) -> Self {
        Self {
            page_type,
            checksum: 0,
            page_id,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]);
        let mut page_id = [0u8; 4];
        page_id.copy_from_slice(&data[Self::OFFSET_PAGE_ID..Self::OFFSET_PAGE_ID + 4]);

        Self {
            page_type: PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]),
            checksum: u32::from_le_bytes(checksum),
            page_id: i32::from_le_bytes(page_id),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_PAGE_ID..Self::OFFSET_PAGE_ID + 4]
            .copy_from_slice(&self.page_id.to_le_bytes());
        data[Self::OFFSET_PAGE_ID + 4..Self::SIZE].fill(0);
    }

    /// CRC32 of a page with the checksum field treated as zero.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Whether the stored checksum matches the page contents.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}
