//! Redirect and incoming link properties.

use serde_json::json;
use tracing::debug;

use cirrus_search::IncomingLinkQuery;
use cirrus_types::{field_names, Document, FieldValue, PageRef, Revision};

use crate::builder::{BuilderKind, PagePropertyBuilder};
use crate::context::BuildContext;
use crate::error::BuildError;

struct PendingCount {
    slot: usize,
    redirects: usize,
    query: IncomingLinkQuery,
}

/// Writes `redirect` and `incoming_links`.
///
/// Incoming link counts are queued per document and resolved for the whole
/// batch with one multi-count call.
pub struct LinkAndRedirectProperties {
    context: BuildContext,
    pending: Vec<PendingCount>,
}

impl LinkAndRedirectProperties {
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            pending: Vec::new(),
        }
    }
}

impl PagePropertyBuilder for LinkAndRedirectProperties {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Links
    }

    fn initialize(
        &mut self,
        _document: &mut Document,
        _page: &PageRef,
        _revision: &Revision,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    fn finalize(
        &mut self,
        document: &mut Document,
        page: &PageRef,
        _revision: &Revision,
        slot: usize,
    ) -> Result<(), BuildError> {
        let max_redirects = self.context.settings.max_redirects;
        let mut redirects = self.context.pages.redirects(page, max_redirects)?;
        redirects.truncate(max_redirects);

        let namespaces = self.context.namespaces.as_ref();
        let mut titles = Vec::with_capacity(redirects.len() + 1);
        titles.push(namespaces.prefixed_title(page.namespace, &page.title));
        titles.extend(
            redirects
                .iter()
                .map(|redirect| namespaces.prefixed_title(redirect.namespace, &redirect.title)),
        );

        let entries: Vec<_> = redirects
            .iter()
            .map(|redirect| json!({"namespace": redirect.namespace, "title": redirect.title}))
            .collect();
        document.set(field_names::REDIRECT, FieldValue::Nested(entries.into()));

        self.pending.push(PendingCount {
            slot,
            redirects: redirects.len(),
            query: IncomingLinkQuery::new(document.id(), titles),
        });
        Ok(())
    }

    fn finish_finalize_batch(&mut self, documents: &mut [Document]) -> Result<(), BuildError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let queries: Vec<IncomingLinkQuery> = pending.iter().map(|p| p.query.clone()).collect();
        let counts = self.context.links.count_incoming(&queries)?;
        if counts.len() != pending.len() {
            return Err(BuildError::recoverable(format!(
                "link counter returned {} counts for {} queries",
                counts.len(),
                pending.len()
            )));
        }

        for (request, count) in pending.iter().zip(counts) {
            let Some(document) = documents.get_mut(request.slot) else {
                continue;
            };
            let incoming = count.saturating_add(request.redirects as u64);
            let incoming = i64::try_from(incoming).unwrap_or(i64::MAX);
            document.set(field_names::INCOMING_LINKS, incoming);
        }
        debug!(documents = pending.len(), "Resolved incoming link counts");
        Ok(())
    }
}
