//! In-memory sources for tests and local experiments.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use cirrus_search::IncomingLinkQuery;
use cirrus_types::{NamespaceId, PageId, PageRef, Revision, RevisionId};

use crate::error::SourceError;
use crate::source::{LinkCounter, NamespaceResolver, PageStore, RenderedPage, Renderer};

/// Timestamp of revision `revision_id` in the mock wiki.
///
/// Ids wrap every million minutes so any id maps to a valid timestamp.
pub fn revision_timestamp(revision_id: RevisionId) -> DateTime<Utc> {
    let base = DateTime::from_timestamp(1_600_000_000, 0).unwrap_or_default();
    let offset = i64::try_from(revision_id % 1_000_000).unwrap_or_default();
    base + Duration::minutes(offset)
}

#[derive(Default)]
struct WikiState {
    pages: BTreeMap<PageId, PageRef>,
    revisions: BTreeMap<RevisionId, Revision>,
    rendered: HashMap<RevisionId, RenderedPage>,
    redirects: HashMap<PageId, Vec<PageRef>>,
    fail_renders: bool,
}

/// A wiki held in memory, acting as page store and renderer.
#[derive(Default)]
pub struct InMemoryWiki {
    state: Mutex<WikiState>,
    renders: AtomicUsize,
}

impl InMemoryWiki {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, WikiState>, SourceError> {
        self.state
            .lock()
            .map_err(|_| SourceError::PageStore("wiki state poisoned".to_string()))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut WikiState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }

    /// Create a page whose only revision is `revision_id`.
    pub fn create_page(
        &self,
        page_id: PageId,
        namespace: NamespaceId,
        title: &str,
        revision_id: RevisionId,
        rendered: RenderedPage,
    ) -> PageRef {
        let page = PageRef::new(
            page_id,
            namespace,
            title,
            revision_id,
            revision_timestamp(revision_id),
        );
        let revision = Revision::new(revision_id, page_id, revision_timestamp(revision_id));
        let stored = page.clone();
        self.with_state(move |state| {
            state.pages.insert(page_id, stored);
            state.revisions.insert(revision_id, revision);
            state.rendered.insert(revision_id, rendered);
        });
        page
    }

    /// Save a new revision, making it the page's latest.
    pub fn edit_page(
        &self,
        page_id: PageId,
        revision_id: RevisionId,
        rendered: RenderedPage,
    ) -> Option<PageRef> {
        self.with_state(|state| {
            let page = state.pages.get_mut(&page_id)?;
            page.latest_revision_id = revision_id;
            page.touched = revision_timestamp(revision_id);
            let page = page.clone();
            state
                .revisions
                .insert(revision_id, Revision::new(revision_id, page_id, page.touched));
            state.rendered.insert(revision_id, rendered);
            Some(page)
        })
        .flatten()
    }

    /// Bump a page's touched time without a new revision.
    pub fn touch_page(&self, page_id: PageId, touched: DateTime<Utc>) {
        self.with_state(|state| {
            if let Some(page) = state.pages.get_mut(&page_id) {
                page.touched = touched;
            }
        });
    }

    /// Register `redirect` as redirecting to `target`.
    pub fn add_redirect(&self, target: PageId, redirect: PageRef) {
        self.with_state(|state| state.redirects.entry(target).or_default().push(redirect));
    }

    pub fn delete_page(&self, page_id: PageId) {
        self.with_state(|state| state.pages.remove(&page_id));
    }

    pub fn delete_revision(&self, revision_id: RevisionId) {
        self.with_state(|state| state.revisions.remove(&revision_id));
    }

    /// Make every render fail until reset.
    pub fn set_fail_renders(&self, fail: bool) {
        self.with_state(|state| state.fail_renders = fail);
    }

    /// Number of renders performed.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PageStore for InMemoryWiki {
    fn page(&self, page_id: PageId) -> Result<Option<PageRef>, SourceError> {
        Ok(self.state()?.pages.get(&page_id).cloned())
    }

    fn revision(&self, revision_id: RevisionId) -> Result<Option<Revision>, SourceError> {
        Ok(self.state()?.revisions.get(&revision_id).cloned())
    }

    fn first_revision_timestamps(
        &self,
        page_ids: &[PageId],
    ) -> Result<HashMap<PageId, DateTime<Utc>>, SourceError> {
        let state = self.state()?;
        let mut first = HashMap::new();
        for revision in state.revisions.values() {
            if !page_ids.contains(&revision.page_id) {
                continue;
            }
            first
                .entry(revision.page_id)
                .and_modify(|ts: &mut DateTime<Utc>| *ts = (*ts).min(revision.timestamp))
                .or_insert(revision.timestamp);
        }
        Ok(first)
    }

    fn redirects(&self, page: &PageRef, limit: usize) -> Result<Vec<PageRef>, SourceError> {
        let state = self.state()?;
        Ok(state
            .redirects
            .get(&page.page_id)
            .map(|redirects| redirects.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

impl Renderer for InMemoryWiki {
    fn render(&self, page: &PageRef, revision: &Revision) -> Result<RenderedPage, SourceError> {
        let state = self.state()?;
        if state.fail_renders {
            return Err(SourceError::Render(format!(
                "renderer unavailable for page {}",
                page.page_id
            )));
        }
        let rendered = state
            .rendered
            .get(&revision.revision_id)
            .cloned()
            .ok_or_else(|| {
                SourceError::Render(format!("no content for revision {}", revision.revision_id))
            })?;
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(rendered)
    }
}

/// Namespace table of a typical wiki.
pub struct InMemoryNamespaces {
    names: BTreeMap<NamespaceId, String>,
    aliases: HashMap<String, NamespaceId>,
}

impl Default for InMemoryNamespaces {
    fn default() -> Self {
        let names: BTreeMap<NamespaceId, String> = [
            (0, ""),
            (1, "Talk"),
            (2, "User"),
            (4, "Project"),
            (6, "File"),
            (10, "Template"),
            (12, "Help"),
            (14, "Category"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();
        let aliases = [("wp".to_string(), 4), ("image".to_string(), 6)]
            .into_iter()
            .collect();
        Self { names, aliases }
    }
}

impl NamespaceResolver for InMemoryNamespaces {
    fn namespace_name(&self, namespace: NamespaceId) -> Option<String> {
        self.names.get(&namespace).cloned()
    }

    fn resolve_prefix(&self, prefix: &str) -> Option<NamespaceId> {
        let folded = prefix.replace('_', " ").trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }
        self.names
            .iter()
            .find(|(_, name)| name.to_lowercase() == folded)
            .map(|(id, _)| *id)
            .or_else(|| self.aliases.get(&folded).copied())
    }
}

/// Link graph held in memory, keyed by linking document id.
#[derive(Default)]
pub struct InMemoryLinks {
    links: Mutex<HashMap<String, Vec<String>>>,
    calls: AtomicUsize,
}

impl InMemoryLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing links of a document.
    pub fn set_links(&self, doc_id: &str, targets: &[&str]) {
        if let Ok(mut links) = self.links.lock() {
            links.insert(
                doc_id.to_string(),
                targets.iter().map(|t| t.to_string()).collect(),
            );
        }
    }

    /// Number of `count_incoming` calls served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LinkCounter for InMemoryLinks {
    fn count_incoming(&self, queries: &[IncomingLinkQuery]) -> Result<Vec<u64>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let links = self
            .links
            .lock()
            .map_err(|_| SourceError::PageStore("link graph poisoned".to_string()))?;
        Ok(queries
            .iter()
            .map(|query| {
                links
                    .iter()
                    .filter(|(doc_id, _)| **doc_id != query.doc_id)
                    .filter(|(_, targets)| targets.iter().any(|t| query.titles.contains(t)))
                    .count() as u64
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_moves_latest_revision() {
        let wiki = InMemoryWiki::new();
        wiki.create_page(1, 0, "Foo", 10, RenderedPage::default());
        let page = wiki.edit_page(1, 11, RenderedPage::default()).unwrap();

        assert_eq!(page.latest_revision_id, 11);
        assert_eq!(wiki.page(1).unwrap().unwrap().latest_revision_id, 11);
        assert_eq!(wiki.revision(10).unwrap().unwrap().page_id, 1);

        let first = wiki.first_revision_timestamps(&[1, 2]).unwrap();
        assert_eq!(first.get(&1), Some(&revision_timestamp(10)));
        assert!(!first.contains_key(&2));
    }

    #[test]
    fn test_failing_renderer() {
        let wiki = InMemoryWiki::new();
        let page = wiki.create_page(1, 0, "Foo", 10, RenderedPage::default());
        let revision = wiki.revision(10).unwrap().unwrap();

        wiki.set_fail_renders(true);
        assert!(wiki.render(&page, &revision).is_err());
        wiki.set_fail_renders(false);
        assert!(wiki.render(&page, &revision).is_ok());
        assert_eq!(wiki.render_count(), 1);
    }

    #[test]
    fn test_namespace_resolution() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(ns.resolve_prefix("talk"), Some(1));
        assert_eq!(ns.resolve_prefix("WP"), Some(4));
        assert_eq!(ns.resolve_prefix(""), None);
        assert_eq!(ns.resolve_prefix("Nope"), None);
        assert_eq!(ns.prefixed_title(0, "Foo"), "Foo");
        assert_eq!(ns.prefixed_title(14, "Foo"), "Category:Foo");
    }

    #[test]
    fn test_link_counts() {
        let links = InMemoryLinks::new();
        links.set_links("1", &["Foo", "Bar"]);
        links.set_links("2", &["Foo"]);
        links.set_links("3", &["Foo"]);

        let counts = links
            .count_incoming(&[
                IncomingLinkQuery::new("3", vec!["Foo".to_string()]),
                IncomingLinkQuery::new("9", vec!["Bar".to_string(), "Foo".to_string()]),
            ])
            .unwrap();
        assert_eq!(counts, vec![2, 3]);
        assert_eq!(links.call_count(), 1);
    }
}
