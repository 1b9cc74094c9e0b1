//! Common types and utilities shared across bucketdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (PageId, FrameId, Rid)
//! - Fixed-width encoding for on-page values and key comparators

pub mod config;
pub mod error;
mod frame_id;
mod key;
mod page_id;
mod rid;
mod storable;

pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use key::{GenericComparator, GenericKey, KeyComparator, OrdComparator};
pub use page_id::PageId;
pub use rid::Rid;
pub use storable::Storable;
