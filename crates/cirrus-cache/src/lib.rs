//! Rendered-content cache for the document build pipeline.
//!
//! Provides:
//! - The [`ContentCache`] boundary shared by every finalize attempt
//! - Keys embedding page, revision, touched time and content schema version
//! - An in-process LRU cache with per-entry expiry
//! - A RocksDB cache shared by worker processes on one host

pub mod cache;
pub mod column_families;
pub mod db;
mod entry;
pub mod error;
pub mod key;
pub mod memory;

pub use cache::{get_json, put_json, ContentCache};
pub use db::RocksContentCache;
pub use error::CacheError;
pub use key::ContentCacheKey;
pub use memory::MemoryContentCache;
