//! Eviction policy implementations (replacers).
//!
//! A replacer only tracks frames that are currently evictable. The buffer
//! pool calls [`Replacer::unpin`] when a frame's pin count drops to zero
//! and [`Replacer::pin`] when a frame is handed out again.
//!
//! Currently implements:
//! - [`LruReplacer`] - Least recently unpinned is evicted first

mod lru;

pub use lru::LruReplacer;

use crate::common::FrameId;

/// Eviction policy over frame ids.
///
/// Methods take `&self`; implementations synchronize internally so a
/// replacer can be shared by the pool without an outer lock.
pub trait Replacer: Send + Sync {
    /// Remove and return the frame to evict, or `None` if nothing is evictable.
    fn victim(&self) -> Option<FrameId>;

    /// The frame is in use and must not be evicted. No-op if untracked.
    fn pin(&self, frame_id: FrameId);

    /// The frame may be evicted. No-op if already tracked.
    fn unpin(&self, frame_id: FrameId);

    /// Put back a frame returned by [`victim`](Self::victim) that could not
    /// be evicted after all, so it is the next victim again.
    fn restore(&self, frame_id: FrameId);

    /// Number of evictable frames.
    fn size(&self) -> usize;
}
