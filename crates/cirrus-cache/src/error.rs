//! Content cache error types.

use thiserror::Error;

/// Errors that can occur in the content cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Stored entry could not be decoded
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// In-process cache lock poisoned by a panicking thread
    #[error("Cache lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}
