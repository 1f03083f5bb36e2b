//! Property builder capability.
//!
//! Each builder contributes a slice of a document's fields. Builders are
//! created fresh for every initialize or finalize call and may queue work in
//! their per-document hooks to flush it once in the batch hooks.

use std::collections::BTreeMap;
use std::fmt;

use cirrus_types::{BuilderFlags, Document, PageId, PageRef, Revision};

use crate::context::BuildContext;
use crate::default_props::DefaultProperties;
use crate::error::BuildError;
use crate::links::LinkAndRedirectProperties;
use crate::rendered::RenderedContentProperties;

/// Contributes fields to page documents in two phases.
pub trait PagePropertyBuilder: Send {
    /// Which builder this is.
    fn kind(&self) -> BuilderKind;

    /// Cheap per-document step, run once when the document is created.
    fn initialize(
        &mut self,
        document: &mut Document,
        page: &PageRef,
        revision: &Revision,
    ) -> Result<(), BuildError>;

    /// Flush lookups queued by [`initialize`](Self::initialize).
    fn finish_initialize_batch(
        &mut self,
        _documents: &mut BTreeMap<PageId, Document>,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    /// Expensive per-document step, run on every write attempt.
    ///
    /// `slot` is the position of `document` in the slice later handed to
    /// [`finish_finalize_batch`](Self::finish_finalize_batch).
    fn finalize(
        &mut self,
        document: &mut Document,
        page: &PageRef,
        revision: &Revision,
        slot: usize,
    ) -> Result<(), BuildError>;

    /// Resolve lookups queued by [`finalize`](Self::finalize).
    fn finish_finalize_batch(&mut self, _documents: &mut [Document]) -> Result<(), BuildError> {
        Ok(())
    }
}

/// The closed set of property builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuilderKind {
    Default,
    Rendered,
    Links,
}

impl BuilderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::Default => "default",
            BuilderKind::Rendered => "rendered",
            BuilderKind::Links => "links",
        }
    }

    /// Create a fresh builder of this kind.
    pub fn instantiate(self, context: &BuildContext) -> Box<dyn PagePropertyBuilder> {
        match self {
            BuilderKind::Default => Box::new(DefaultProperties::new(context.clone())),
            BuilderKind::Rendered => Box::new(RenderedContentProperties::new(context.clone())),
            BuilderKind::Links => Box::new(LinkAndRedirectProperties::new(context.clone())),
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builders active for `flags`, in execution order.
pub fn create_builders(flags: BuilderFlags) -> Vec<BuilderKind> {
    let mut kinds = vec![BuilderKind::Default];
    if !flags.contains(BuilderFlags::SKIP_PARSE) {
        kinds.push(BuilderKind::Rendered);
    }
    if !flags.contains(BuilderFlags::SKIP_LINKS) {
        kinds.push(BuilderKind::Links);
    }
    kinds
}

/// Whether a write may create the document when it is missing.
///
/// A document missing some of its properties must only update an existing
/// one, unless the caller explicitly asked to index on skip.
pub fn can_upsert(flags: BuilderFlags) -> bool {
    let complete =
        !flags.contains(BuilderFlags::SKIP_PARSE) && !flags.contains(BuilderFlags::SKIP_LINKS);
    complete || flags.contains(BuilderFlags::INDEX_ON_SKIP)
}
