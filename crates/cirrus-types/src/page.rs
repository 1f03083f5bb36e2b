//! Page and revision references captured for one build invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page identifier, stable for the lifetime of the page.
pub type PageId = u64;

/// Revision identifier, monotonic per page.
pub type RevisionId = u64;

/// Namespace identifier (0 is the main/article namespace).
pub type NamespaceId = i32;

/// A page as seen by the page store at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page_id: PageId,
    pub namespace: NamespaceId,
    /// Title text without the namespace prefix, spaces not underscores
    pub title: String,
    /// Current revision of the page
    pub latest_revision_id: RevisionId,
    /// Last time anything affecting the rendered output of the page changed
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub touched: DateTime<Utc>,
}

impl PageRef {
    /// Create a page reference.
    pub fn new(
        page_id: PageId,
        namespace: NamespaceId,
        title: impl Into<String>,
        latest_revision_id: RevisionId,
        touched: DateTime<Utc>,
    ) -> Self {
        Self {
            page_id,
            namespace,
            title: title.into(),
            latest_revision_id,
            touched,
        }
    }
}

/// A single revision of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_id: RevisionId,
    pub page_id: PageId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Revision {
    /// Create a revision.
    pub fn new(revision_id: RevisionId, page_id: PageId, timestamp: DateTime<Utc>) -> Self {
        Self {
            revision_id,
            page_id,
            timestamp,
        }
    }
}

/// One entry of an initialize batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEntry {
    /// A page; its current revision is built
    Page(PageRef),
    /// A bare revision id; the page is resolved from it
    Revision(RevisionId),
}

impl From<PageRef> for BuildEntry {
    fn from(page: PageRef) -> Self {
        BuildEntry::Page(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_ref_roundtrip() {
        let touched = Utc.timestamp_millis_opt(1_706_540_400_000).unwrap();
        let page = PageRef::new(42, 0, "Main Page", 7, touched);
        let json = serde_json::to_string(&page).unwrap();
        let decoded: PageRef = serde_json::from_str(&json).unwrap();
        assert_eq!(page, decoded);
    }
}
