//! Extendible hash index.
//!
//! The table keeps one directory page and a set of bucket pages, all
//! fetched through a [`BufferPool`](crate::buffer::BufferPool). Buckets
//! split when they overflow and merge back with their split image when
//! they empty out.

mod extendible_hash_table;
mod hash_function;

pub use extendible_hash_table::ExtendibleHashTable;
pub use hash_function::{DefaultKeyHasher, KeyHasher};
