//! In-process LRU content cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use lru::LruCache;
use tracing::trace;

use crate::cache::{expires_at, ContentCache};
use crate::entry::is_expired;
use crate::error::CacheError;
use crate::key::ContentCacheKey;

/// Default number of entries kept in memory
pub const DEFAULT_CAPACITY: usize = 1024;

struct CachedContent {
    expires_at_ms: i64,
    value: Vec<u8>,
}

/// Bounded LRU cache with per-entry expiry.
///
/// Suitable for a single worker process; use [`crate::RocksContentCache`] to
/// share entries between processes.
pub struct MemoryContentCache {
    entries: Mutex<LruCache<ContentCacheKey, CachedContent>>,
}

impl MemoryContentCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ContentCache for MemoryContentCache {
    fn get(&self, key: &ContentCacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        let expired = match entries.get(key) {
            Some(entry) if !is_expired(entry.expires_at_ms, Utc::now()) => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(page_id = key.page_id, revision_id = key.revision_id, "Evicting expired content");
            entries.pop(key);
        }
        Ok(None)
    }

    fn put(&self, key: &ContentCacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = CachedContent {
            expires_at_ms: expires_at(ttl).timestamp_millis(),
            value: value.to_vec(),
        };
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned)?
            .put(key.clone(), entry);
        Ok(())
    }
}
