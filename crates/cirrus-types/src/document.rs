//! The page document sent to the search index.
//!
//! A document is created once per (page, revision, flags) in the cheap build
//! phase, serialized to the retry queue with its hints, and then completed in
//! place by every finalize attempt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CirrusError;
use crate::field::{FieldValue, Scalar};
use crate::hints::Hints;
use crate::page::{PageId, RevisionId};

/// Names of the fields written by the build pipeline.
pub mod field_names {
    pub const VERSION: &str = "version";
    pub const WIKI: &str = "wiki";
    pub const PAGE_ID: &str = "page_id";
    pub const NAMESPACE: &str = "namespace";
    pub const NAMESPACE_TEXT: &str = "namespace_text";
    pub const TITLE: &str = "title";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CREATE_TIMESTAMP: &str = "create_timestamp";

    pub const TEXT: &str = "text";
    pub const OPENING_TEXT: &str = "opening_text";
    pub const AUXILIARY_TEXT: &str = "auxiliary_text";
    pub const HEADING: &str = "heading";
    pub const SOURCE_TEXT: &str = "source_text";
    pub const TEXT_BYTES: &str = "text_bytes";
    pub const CATEGORY: &str = "category";
    pub const TEMPLATE: &str = "template";
    pub const OUTGOING_LINK: &str = "outgoing_link";
    pub const EXTERNAL_LINK: &str = "external_link";
    pub const CONTENT_MODEL: &str = "content_model";
    pub const LANGUAGE: &str = "language";
    pub const FILE_TEXT: &str = "file_text";
    pub const DISPLAY_TITLE: &str = "display_title";

    pub const REDIRECT: &str = "redirect";
    pub const INCOMING_LINKS: &str = "incoming_links";
}

/// Document identity for a page.
///
/// Pure function of the page id so it is stable across phases and retries.
pub fn document_id(page_id: PageId) -> String {
    page_id.to_string()
}

/// A structured page record destined for the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    upsert: bool,
    fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Hints::is_empty")]
    hints: Hints,
}

impl Document {
    /// Create an empty document for a page.
    pub fn for_page(page_id: PageId) -> Self {
        Self {
            id: document_id(page_id),
            upsert: false,
            fields: BTreeMap::new(),
            hints: Hints::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the write may insert the document when it is missing.
    pub fn upsert(&self) -> bool {
        self.upsert
    }

    pub fn set_upsert(&mut self, upsert: bool) {
        self.upsert = upsert;
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(field)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    pub fn hints_mut(&mut self) -> &mut Hints {
        &mut self.hints
    }

    /// Revision id this document was built for.
    pub fn version(&self) -> Option<RevisionId> {
        self.get(field_names::VERSION)
            .and_then(FieldValue::as_i64)
            .and_then(|v| u64::try_from(v).ok())
    }

    /// Append a string to a list field.
    ///
    /// A missing field becomes a one-element list and a scalar string is
    /// promoted to a list. Returns false, leaving the field untouched, when
    /// the field holds anything else.
    pub fn append_to_list(&mut self, field: &str, value: &str) -> bool {
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        match entry {
            FieldValue::List(items) => {
                items.push(Scalar::from(value));
                true
            }
            FieldValue::Scalar(Scalar::Str(existing)) => {
                let existing = std::mem::take(existing);
                *entry = FieldValue::strings([existing, value.to_string()]);
                true
            }
            _ => false,
        }
    }

    /// Payload sent to the search index: fields only, never hints.
    pub fn index_payload(&self) -> Result<Vec<u8>, CirrusError> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    /// Serialize for the retry queue, hints included.
    pub fn to_queue_bytes(&self) -> Result<Vec<u8>, CirrusError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the retry queue.
    pub fn from_queue_bytes(bytes: &[u8]) -> Result<Self, CirrusError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
