//! The shared rendered-content cache boundary.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::key::ContentCacheKey;

/// Cache of rendered page content shared by every finalize attempt.
///
/// Writers race freely: the last `put` for a key wins and no lock is held
/// across processes. Expired entries behave as misses.
pub trait ContentCache: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &ContentCacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store an entry that expires after `ttl`.
    fn put(&self, key: &ContentCacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}

/// Fetch and deserialize a JSON entry.
pub fn get_json<T: DeserializeOwned>(
    cache: &dyn ContentCache,
    key: &ContentCacheKey,
) -> Result<Option<T>, CacheError> {
    match cache.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize and store a JSON entry.
pub fn put_json<T: Serialize>(
    cache: &dyn ContentCache,
    key: &ContentCacheKey,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(value)?;
    cache.put(key, &bytes, ttl)
}

/// Expiry instant for an entry written now.
pub(crate) fn expires_at(ttl: Duration) -> chrono::DateTime<chrono::Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    chrono::Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}
