//! Two-phase document build pipeline.
//!
//! `initialize` is cheap: it creates one lightweight document per page,
//! records the builder flags as a hint, and the result may be queued for
//! later writes. `finalize` is expensive and runs on every write attempt:
//! it re-checks revision freshness, re-derives the builders from the flags
//! hint, runs them, then bounds the document size.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use cirrus_limiter::SizeLimiter;
use cirrus_types::{
    field_names, BuildEntry, BuilderFlags, Document, PageId, PageRef, Revision,
    SizeLimiterProfile,
};

use crate::builder::{can_upsert, create_builders, PagePropertyBuilder};
use crate::context::BuildContext;
use crate::error::{indexable_id, BuildError};

/// Builds page documents from a wiki's sources.
pub struct BuildPipeline {
    context: BuildContext,
    limiter: SizeLimiter,
}

impl BuildPipeline {
    /// Create a pipeline truncating documents with `profile`.
    pub fn new(context: BuildContext, profile: SizeLimiterProfile) -> Self {
        Self {
            context,
            limiter: SizeLimiter::new(profile),
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Cheap phase: one document per resolvable entry, keyed by page id.
    ///
    /// Entries whose page or revision cannot be found are logged and
    /// skipped.
    pub fn initialize(
        &self,
        entries: &[BuildEntry],
        flags: BuilderFlags,
    ) -> Result<BTreeMap<PageId, Document>, BuildError> {
        let mut builders = self.builders(flags);
        let mut documents = BTreeMap::new();

        for entry in entries {
            let Some((page, revision)) = self.resolve_entry(entry)? else {
                continue;
            };

            let mut document = Document::for_page(page.page_id);
            document.set(
                field_names::VERSION,
                indexable_id(field_names::VERSION, revision.revision_id)?,
            );
            document.set_upsert(can_upsert(flags));
            document.hints_mut().set_builder_flags(flags);

            for builder in builders.iter_mut() {
                builder.initialize(&mut document, &page, &revision)?;
            }
            documents.insert(page.page_id, document);
        }

        for builder in builders.iter_mut() {
            builder.finish_initialize_batch(&mut documents)?;
        }

        info!(
            entries = entries.len(),
            documents = documents.len(),
            flags = %flags,
            "Initialized documents"
        );
        Ok(documents)
    }

    /// Expensive phase for one document.
    ///
    /// Returns `false` when the document must not be written: its revision
    /// can no longer be resolved, or `enforce_latest` is set and the page
    /// has moved on. A supplied `revision` other than the one the document
    /// was initialized with is an error.
    pub fn finalize(
        &self,
        document: &mut Document,
        enforce_latest: bool,
        revision: Option<&Revision>,
    ) -> Result<bool, BuildError> {
        let accepted = self.finalize_documents(
            std::slice::from_mut(document),
            enforce_latest,
            &[revision],
        )?;
        Ok(accepted.first().copied().unwrap_or(false))
    }

    /// Expensive phase for many documents.
    ///
    /// Deferred lookups of every document resolve together, then each
    /// accepted document is size limited. Results are in input order.
    pub fn finalize_batch(
        &self,
        documents: &mut [Document],
        enforce_latest: bool,
    ) -> Result<Vec<bool>, BuildError> {
        let revisions = vec![None; documents.len()];
        self.finalize_documents(documents, enforce_latest, &revisions)
    }

    fn finalize_documents(
        &self,
        documents: &mut [Document],
        enforce_latest: bool,
        revisions: &[Option<&Revision>],
    ) -> Result<Vec<bool>, BuildError> {
        let mut accepted = vec![false; documents.len()];
        let mut limited = vec![false; documents.len()];
        let mut groups: BTreeMap<BuilderFlags, Vec<Box<dyn PagePropertyBuilder>>> =
            BTreeMap::new();

        for (slot, document) in documents.iter_mut().enumerate() {
            let Some(flags) = document.hints().builder_flags()? else {
                debug!(doc_id = %document.id(), "No builder flags hint, nothing to finalize");
                accepted[slot] = true;
                continue;
            };

            let supplied = revisions.get(slot).copied().flatten();
            let Some((page, revision)) =
                self.resolve_current(document, supplied, enforce_latest)?
            else {
                continue;
            };

            let builders = groups.entry(flags).or_insert_with(|| self.builders(flags));
            for builder in builders.iter_mut() {
                builder.finalize(document, &page, &revision, slot)?;
            }
            accepted[slot] = true;
            limited[slot] = true;
        }

        for builders in groups.values_mut() {
            for builder in builders.iter_mut() {
                builder.finish_finalize_batch(documents)?;
            }
        }

        for (document, _) in documents
            .iter_mut()
            .zip(&limited)
            .filter(|(_, limited)| **limited)
        {
            self.limiter.resize(document);
        }

        debug!(
            documents = documents.len(),
            accepted = accepted.iter().filter(|a| **a).count(),
            "Finalized documents"
        );
        Ok(accepted)
    }

    /// Page and revision a finalize call should build, `None` to skip.
    fn resolve_current(
        &self,
        document: &Document,
        supplied: Option<&Revision>,
        enforce_latest: bool,
    ) -> Result<Option<(PageRef, Revision)>, BuildError> {
        let version = document.version();

        if let Some(revision) = supplied {
            if version != Some(revision.revision_id) {
                error!(
                    doc_id = %document.id(),
                    expected = ?version,
                    supplied = revision.revision_id,
                    "Finalize called with a different revision than initialize"
                );
                return Err(BuildError::RevisionMismatch {
                    document: document.id().to_string(),
                    expected: version,
                    supplied: revision.revision_id,
                });
            }
        }

        let revision = match (supplied, version) {
            (Some(revision), _) => Some(revision.clone()),
            (None, Some(version)) => self.context.pages.revision(version)?,
            (None, None) => None,
        };
        let Some(revision) = revision else {
            info!(doc_id = %document.id(), version = ?version, "Revision no longer available, skipping");
            return Ok(None);
        };

        let Some(page) = self.context.pages.page(revision.page_id)? else {
            info!(doc_id = %document.id(), page_id = revision.page_id, "Page no longer exists, skipping");
            return Ok(None);
        };

        if enforce_latest && page.latest_revision_id != revision.revision_id {
            info!(
                doc_id = %document.id(),
                version = revision.revision_id,
                latest = page.latest_revision_id,
                "Stale revision, skipping"
            );
            return Ok(None);
        }

        Ok(Some((page, revision)))
    }

    fn resolve_entry(&self, entry: &BuildEntry) -> Result<Option<(PageRef, Revision)>, BuildError> {
        match entry {
            BuildEntry::Page(page) => {
                match self.context.pages.revision(page.latest_revision_id)? {
                    Some(revision) => Ok(Some((page.clone(), revision))),
                    None => {
                        warn!(
                            page_id = page.page_id,
                            revision_id = page.latest_revision_id,
                            "No revision for page, skipping"
                        );
                        Ok(None)
                    }
                }
            }
            BuildEntry::Revision(revision_id) => {
                let Some(revision) = self.context.pages.revision(*revision_id)? else {
                    warn!(revision_id, "Revision not found, skipping");
                    return Ok(None);
                };
                match self.context.pages.page(revision.page_id)? {
                    Some(page) => Ok(Some((page, revision))),
                    None => {
                        warn!(page_id = revision.page_id, revision_id, "Page not found, skipping");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn builders(&self, flags: BuilderFlags) -> Vec<Box<dyn PagePropertyBuilder>> {
        create_builders(flags)
            .into_iter()
            .map(|kind| kind.instantiate(&self.context))
            .collect()
    }
}
