//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between the hash index and
//! disk. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPool`] - The page cache contract
//! - [`BufferPoolManagerInstance`] - A single pool with one lock
//! - [`ShardedBufferPoolManager`] - Pages partitioned over several pools
//! - [`Frame`] - A slot in the buffer pool holding a page + metadata
//! - [`PageReadGuard`] / [`PageWriteGuard`] - RAII guards for page access
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod buffer_pool;
mod buffer_pool_manager_instance;
mod frame;
mod page_guard;
pub mod replacer;
mod sharded_buffer_pool_manager;
mod stats;

pub use buffer_pool::BufferPool;
pub use buffer_pool_manager_instance::BufferPoolManagerInstance;
pub use frame::Frame;
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use sharded_buffer_pool_manager::ShardedBufferPoolManager;
pub use stats::{BufferPoolStats, StatsSnapshot};
