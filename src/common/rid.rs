//! Record identifier.

use std::fmt;

use super::storable::Storable;
use super::PageId;

/// Locates a tuple: the page holding it and its slot on that page.
///
/// This is the value type an index over a table stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_id: PageId,
    pub slot: u32,
}

impl Rid {
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }
}

impl Default for Rid {
    fn default() -> Self {
        Self::new(PageId::INVALID, 0)
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, {})", self.page_id.0, self.slot)
    }
}

impl Storable for Rid {
    const SIZE: usize = 8;

    fn write_to(&self, buf: &mut [u8]) {
        self.page_id.0.write_to(&mut buf[0..4]);
        self.slot.write_to(&mut buf[4..8]);
    }

    fn read_from(buf: &[u8]) -> Self {
        Self {
            page_id: PageId::new(i32::read_from(&buf[0..4])),
            slot: u32::read_from(&buf[4..8]),
        }
    }
}
