//! Read-only external sources consulted while building documents.
//!
//! Each source is a trait so the orchestrator can be driven by a live wiki
//! backend or by the in-memory fakes in [`crate::mock`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cirrus_search::{IncomingLinkQuery, LinkSearcher};
use cirrus_types::{NamespaceId, PageId, PageRef, Revision, RevisionId};

use crate::error::SourceError;

/// Page and revision lookups.
pub trait PageStore: Send + Sync {
    /// Current state of a page, `None` when it does not exist.
    fn page(&self, page_id: PageId) -> Result<Option<PageRef>, SourceError>;

    /// A revision, `None` when it does not exist or was deleted.
    fn revision(&self, revision_id: RevisionId) -> Result<Option<Revision>, SourceError>;

    /// Timestamp of the oldest revision of each page, in one lookup.
    ///
    /// Pages without revisions are absent from the result.
    fn first_revision_timestamps(
        &self,
        page_ids: &[PageId],
    ) -> Result<HashMap<PageId, DateTime<Utc>>, SourceError>;

    /// Pages redirecting to `page`, at most `limit`.
    fn redirects(&self, page: &PageRef, limit: usize) -> Result<Vec<PageRef>, SourceError>;
}

/// Output of rendering one revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// Rendered HTML of the page body
    pub html: String,
    /// Raw source of the revision, possibly not valid UTF-8
    pub source: Vec<u8>,
    pub content_model: String,
    pub language: String,
    /// Display title as set by the page, markup included
    pub display_title: Option<String>,
    pub categories: Vec<String>,
    pub templates: Vec<String>,
    /// Prefixed titles of linked pages
    pub outgoing_links: Vec<String>,
    pub external_links: Vec<String>,
    /// Text extracted from an attached file (media pages only)
    pub file_text: Option<String>,
}

/// Renders revisions.
pub trait Renderer: Send + Sync {
    fn render(&self, page: &PageRef, revision: &Revision) -> Result<RenderedPage, SourceError>;
}

/// Namespace names and prefix resolution.
pub trait NamespaceResolver: Send + Sync {
    /// Canonical name of a namespace; empty for the main namespace.
    fn namespace_name(&self, namespace: NamespaceId) -> Option<String>;

    /// Namespace a title prefix refers to, aliases included.
    fn resolve_prefix(&self, prefix: &str) -> Option<NamespaceId>;

    /// Title with its namespace prefix, as used by links.
    fn prefixed_title(&self, namespace: NamespaceId, title: &str) -> String {
        match self.namespace_name(namespace) {
            Some(name) if !name.is_empty() => format!("{}:{}", name, title),
            _ => title.to_string(),
        }
    }
}

/// Counts incoming links for many pages in one call.
pub trait LinkCounter: Send + Sync {
    /// Counts in the order of `queries`.
    fn count_incoming(&self, queries: &[IncomingLinkQuery]) -> Result<Vec<u64>, SourceError>;
}

impl LinkCounter for LinkSearcher {
    fn count_incoming(&self, queries: &[IncomingLinkQuery]) -> Result<Vec<u64>, SourceError> {
        Ok(LinkSearcher::count_incoming(self, queries)?)
    }
}
