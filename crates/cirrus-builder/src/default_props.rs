//! Identity and timestamp properties present on every document.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use cirrus_types::{field_names, Document, PageId, PageRef, Revision};

use crate::builder::{BuilderKind, PagePropertyBuilder};
use crate::context::BuildContext;
use crate::error::{indexable_id, BuildError};

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Writes wiki, page, namespace, title and timestamp fields.
///
/// `create_timestamp` needs the oldest revision of each page; those are
/// looked up for the whole batch in [`PagePropertyBuilder::finish_initialize_batch`].
pub struct DefaultProperties {
    context: BuildContext,
    pending_create_timestamps: Vec<PageId>,
}

impl DefaultProperties {
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            pending_create_timestamps: Vec::new(),
        }
    }
}

impl PagePropertyBuilder for DefaultProperties {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Default
    }

    fn initialize(
        &mut self,
        document: &mut Document,
        page: &PageRef,
        revision: &Revision,
    ) -> Result<(), BuildError> {
        let namespace_text = self
            .context
            .namespaces
            .namespace_name(page.namespace)
            .unwrap_or_default();

        document.set(field_names::WIKI, self.context.wiki_id.as_str());
        document.set(
            field_names::PAGE_ID,
            indexable_id(field_names::PAGE_ID, page.page_id)?,
        );
        document.set(field_names::NAMESPACE, i64::from(page.namespace));
        document.set(field_names::NAMESPACE_TEXT, namespace_text);
        document.set(field_names::TITLE, page.title.as_str());
        document.set(field_names::TIMESTAMP, format_timestamp(revision.timestamp));

        self.pending_create_timestamps.push(page.page_id);
        Ok(())
    }

    fn finish_initialize_batch(
        &mut self,
        documents: &mut BTreeMap<PageId, Document>,
    ) -> Result<(), BuildError> {
        if self.pending_create_timestamps.is_empty() {
            return Ok(());
        }
        let page_ids = std::mem::take(&mut self.pending_create_timestamps);
        let timestamps = self.context.pages.first_revision_timestamps(&page_ids)?;

        for page_id in &page_ids {
            let (Some(document), Some(created)) =
                (documents.get_mut(page_id), timestamps.get(page_id))
            else {
                continue;
            };
            document.set(field_names::CREATE_TIMESTAMP, format_timestamp(*created));
        }
        debug!(
            requested = page_ids.len(),
            resolved = timestamps.len(),
            "Resolved create timestamps"
        );
        Ok(())
    }

    fn finalize(
        &mut self,
        _document: &mut Document,
        _page: &PageRef,
        _revision: &Revision,
        _slot: usize,
    ) -> Result<(), BuildError> {
        Ok(())
    }
}
