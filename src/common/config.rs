//! Configuration constants for bucketdb.

/// Size of a page in bytes (4KB).
///
/// Shared by generic, directory and bucket pages. It bounds both the
/// bucket capacity and the maximum directory size.
pub const PAGE_SIZE: usize = 4096;

/// Maximum global depth of an extendible hash directory.
///
/// A directory slot costs 5 bytes (4-byte page id plus 1-byte local
/// depth), so 2^9 slots is the largest power of two fitting in one page.
pub const HASH_DIRECTORY_MAX_DEPTH: u32 = 9;

/// Number of slots reserved in a directory page.
pub const HASH_DIRECTORY_ARRAY_SIZE: usize = 1 << HASH_DIRECTORY_MAX_DEPTH;

/// Global depth of a freshly created hash table.
pub const HASH_INITIAL_GLOBAL_DEPTH: u32 = 1;
