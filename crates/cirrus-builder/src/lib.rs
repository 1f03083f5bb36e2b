//! Two-phase page document builder.
//!
//! This crate turns wiki pages into search documents.
//!
//! ## Key Components
//!
//! - [`BuildPipeline`]: runs the cheap initialize phase and the expensive,
//!   retryable finalize phase
//! - [`PagePropertyBuilder`]: one slice of a document's fields, selected by
//!   [`BuilderFlags`](cirrus_types::BuilderFlags)
//! - [`BuildContext`]: page store, renderer, link counter and content cache
//! - [`mock`]: in-memory sources
//!
//! ## Example
//!
//! ```ignore
//! use cirrus_builder::{BuildPipeline, BuildContext};
//!
//! let pipeline = BuildPipeline::new(context, profile);
//! let mut documents = pipeline.initialize(&entries, BuilderFlags::INDEX_EVERYTHING)?;
//!
//! // Later, possibly in another process after a queue roundtrip
//! for document in documents.values_mut() {
//!     if pipeline.finalize(document, true, None)? {
//!         write(document);
//!     }
//! }
//! ```

pub mod builder;
pub mod context;
pub mod default_props;
pub mod display_title;
pub mod error;
pub mod extract;
pub mod links;
pub mod mock;
pub mod pipeline;
pub mod rendered;
pub mod source;

pub use builder::{can_upsert, create_builders, BuilderKind, PagePropertyBuilder};
pub use context::BuildContext;
pub use default_props::DefaultProperties;
pub use display_title::normalize_display_title;
pub use error::{BuildError, SourceError};
pub use extract::{extract_text, ExtractedText};
pub use links::LinkAndRedirectProperties;
pub use pipeline::BuildPipeline;
pub use rendered::{ExtractedContent, RenderedContentProperties};
pub use source::{LinkCounter, NamespaceResolver, PageStore, RenderedPage, Renderer};
