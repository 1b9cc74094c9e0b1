//! Frame identifier type.

use std::fmt;

/// Index of a frame slot in a buffer pool instance.
///
/// Frame ids are dense (`0..pool_size`), which lets the replacer keep its
/// recency list in plain vectors indexed by frame.
///
/// # Example
/// ```
/// use bucketdb::FrameId;
///
/// let frame_id = FrameId::new(5);
/// assert_eq!(frame_id.index(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }

    /// The slot index into the frame table.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
