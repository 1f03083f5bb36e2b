//! Cache key for rendered page content.
//!
//! Key format: `pc:{page_id:020}:{revision_id:020}:{touched_ms:013}:v{schema}`
//!
//! The revision id and touched timestamp are part of the key, so an edit or
//! a re-render of a dependency produces a new key and stale entries are never
//! read again. They simply age out.

use chrono::{DateTime, Utc};

use cirrus_types::{PageId, PageRef, RevisionId};

/// Identity of one rendered-content cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentCacheKey {
    pub page_id: PageId,
    pub revision_id: RevisionId,
    pub touched: DateTime<Utc>,
    pub schema_version: u32,
}

impl ContentCacheKey {
    pub fn new(
        page_id: PageId,
        revision_id: RevisionId,
        touched: DateTime<Utc>,
        schema_version: u32,
    ) -> Self {
        Self {
            page_id,
            revision_id,
            touched,
            schema_version,
        }
    }

    /// Key for a page rendered at the given revision.
    pub fn for_page(page: &PageRef, revision_id: RevisionId, schema_version: u32) -> Self {
        Self::new(page.page_id, revision_id, page.touched, schema_version)
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "pc:{:020}:{:020}:{:013}:v{}",
            self.page_id,
            self.revision_id,
            self.touched.timestamp_millis(),
            self.schema_version
        )
        .into_bytes()
    }

    /// Prefix shared by every cached revision of a page
    pub fn page_prefix(page_id: PageId) -> Vec<u8> {
        format!("pc:{:020}:", page_id).into_bytes()
    }
}
