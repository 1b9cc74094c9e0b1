//! bucketdb - a buffer pool and a disk-resident extendible hash index.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bucketdb                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Index Layer (index/)                      │   │
//! │  │   ExtendibleHashTable: directory page + bucket pages     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Buffer Pool (buffer/)                     │   │
//! │  │   BufferPool trait                                       │   │
//! │  │   BufferPoolManagerInstance  |  ShardedBufferPoolManager │   │
//! │  │   Frame + LruReplacer + page guards + statistics         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Storage Layer (storage/)                  │   │
//! │  │   DiskManager (file / memory) + Page + typed hash pages  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Rid, Error, config)
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`storage`] - Disk I/O and page formats
//! - [`index`] - Extendible hashing
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use bucketdb::{
//!     BufferPoolManagerInstance, DefaultKeyHasher, ExtendibleHashTable, FileDiskManager,
//!     OrdComparator,
//! };
//!
//! let dm = Arc::new(FileDiskManager::open_or_create("my_index.db")?);
//! let bpm = Arc::new(BufferPoolManagerInstance::new(64, dm));
//!
//! let table = ExtendibleHashTable::<i64, i64, _, _, _>::new(
//!     bpm,
//!     OrdComparator,
//!     DefaultKeyHasher::new(),
//! )?;
//! table.insert(&7, &700)?;
//! assert_eq!(table.get_value(&7)?, vec![700]);
//! # Ok::<(), bucketdb::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{
    Error, FrameId, GenericComparator, GenericKey, KeyComparator, OrdComparator, PageId, Result,
    Rid, Storable,
};

pub use buffer::replacer::{LruReplacer, Replacer};
pub use buffer::{
    BufferPool, BufferPoolManagerInstance, BufferPoolStats, Frame, PageReadGuard, PageWriteGuard,
    ShardedBufferPoolManager, StatsSnapshot,
};
pub use index::hash::{DefaultKeyHasher, ExtendibleHashTable, KeyHasher};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{DiskManager, FileDiskManager, MemoryDiskManager};
