//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`PageHeader`] / [`PageType`] - Tag and checksum carried by typed pages
//! - [`HashTableDirectoryPage`] - Extendible hash directory view
//! - [`HashTableBucketPage`] - Extendible hash bucket view

mod hash_table_bucket_page;
mod hash_table_directory_page;
#[allow(clippy::module_inception)]
mod page;
mod page_header;

pub use hash_table_bucket_page::{max_bucket_capacity, BucketStats, HashTableBucketPage};
pub use hash_table_directory_page::HashTableDirectoryPage;
pub use page::Page;
pub use page_header::{PageHeader, PageType};
