//! # cirrus-types
//!
//! Shared domain types for the page document build pipeline.
//!
//! This crate defines the data model used by every other crate:
//! - [`Document`]: fields, identity, upsert flag and the hint side-channel
//! - [`FieldValue`]: tagged field values (scalar, list, nested)
//! - [`PageRef`] / [`Revision`]: what a build is about
//! - [`BuilderFlags`]: which optional build work to skip
//! - [`SizeLimiterProfile`]: truncation policy
//! - [`Settings`]: layered configuration

pub mod config;
pub mod document;
pub mod error;
pub mod field;
pub mod flags;
pub mod hints;
pub mod page;
pub mod profile;

pub use config::{
    default_size_limiter_profile, BuildSettings, Settings, DEFAULT_PROFILE,
};
pub use document::{document_id, field_names, Document};
pub use error::CirrusError;
pub use field::{FieldValue, Scalar};
pub use flags::BuilderFlags;
pub use hints::{Hints, BUILDER_FLAGS_HINT, SIZE_LIMITER_STATS_HINT};
pub use page::{BuildEntry, NamespaceId, PageId, PageRef, Revision, RevisionId};
pub use profile::{FieldType, SizeLimiterProfile};
