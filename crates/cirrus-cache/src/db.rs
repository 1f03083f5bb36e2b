//! RocksDB-backed content cache shared between worker processes.
//!
//! Provides:
//! - Database open with column family setup
//! - Expiring single-key reads and writes
//! - Purge of expired entries and per-page invalidation

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use cirrus_types::PageId;

use crate::cache::{expires_at, ContentCache};
use crate::column_families::{build_cf_descriptors, CF_PARSED_CONTENT};
use crate::entry::{decode_entry, encode_entry, is_expired};
use crate::error::CacheError;
use crate::key::ContentCacheKey;

/// Persistent content cache
pub struct RocksContentCache {
    db: DB,
}

impl RocksContentCache {
    /// Open the cache at the given path, creating it if necessary
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        info!("Opening content cache at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;
        Ok(Self { db })
    }

    fn content_cf(&self) -> Result<&ColumnFamily, CacheError> {
        self.db
            .cf_handle(CF_PARSED_CONTENT)
            .ok_or_else(|| CacheError::ColumnFamilyNotFound(CF_PARSED_CONTENT.to_string()))
    }

    /// Drop every cached revision of a page.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_page(&self, page_id: PageId) -> Result<usize, CacheError> {
        let cf = self.content_cf()?;
        let prefix = ContentCacheKey::page_prefix(page_id);

        let mut batch = WriteBatch::default();
        let mut count = 0;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            batch.delete_cf(cf, &key);
            count += 1;
        }

        if count > 0 {
            self.db.write(batch)?;
            debug!(page_id, count, "Invalidated cached content");
        }
        Ok(count)
    }

    /// Delete every expired entry.
    ///
    /// Undecodable entries are deleted too. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let cf = self.content_cf()?;
        let now = Utc::now();

        let mut batch = WriteBatch::default();
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let expired = match decode_entry(&value) {
                Ok((expires_at_ms, _)) => is_expired(expires_at_ms, now),
                Err(_) => true,
            };
            if expired {
                batch.delete_cf(cf, &key);
                count += 1;
            }
        }

        if count > 0 {
            self.db.write(batch)?;
        }
        info!(count, "Purged expired content");
        Ok(count)
    }

    /// Number of stored entries, expired ones included.
    pub fn entry_count(&self) -> Result<u64, CacheError> {
        let cf = self.content_cf()?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db.flush_cf(self.content_cf()?)?;
        Ok(())
    }

    /// Trigger compaction of the content column family.
    pub fn compact(&self) -> Result<(), CacheError> {
        let cf = self.content_cf()?;
        info!(cf = %CF_PARSED_CONTENT, "Starting compaction...");
        self.db.compact_range_cf::<&[u8], &[u8]>(cf, None, None);
        info!(cf = %CF_PARSED_CONTENT, "Compaction complete");
        Ok(())
    }
}

impl ContentCache for RocksContentCache {
    fn get(&self, key: &ContentCacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let cf = self.content_cf()?;
        let Some(bytes) = self.db.get_cf(cf, key.to_bytes())? else {
            return Ok(None);
        };
        let (expires_at_ms, payload) = decode_entry(&bytes)?;
        if is_expired(expires_at_ms, Utc::now()) {
            debug!(page_id = key.page_id, revision_id = key.revision_id, "Cached content expired");
            return Ok(None);
        }
        Ok(Some(payload.to_vec()))
    }

    fn put(&self, key: &ContentCacheKey, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let cf = self.content_cf()?;
        self.db
            .put_cf(cf, key.to_bytes(), encode_entry(expires_at(ttl), value))?;
        debug!(
            page_id = key.page_id,
            revision_id = key.revision_id,
            bytes = value.len(),
            "Cached rendered content"
        );
        Ok(())
    }
}
