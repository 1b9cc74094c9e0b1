//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Block I/O contract, with file and in-memory backends
//! - [`page`] - Page types and layouts

mod disk_manager;
mod memory_disk_manager;
pub mod page;

pub use disk_manager::{DiskManager, FileDiskManager};
pub use memory_disk_manager::MemoryDiskManager;
