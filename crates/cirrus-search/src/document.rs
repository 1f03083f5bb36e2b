//! Mapping from page documents to link graph entries.

use tantivy::TantivyDocument;

use cirrus_types::{field_names, Document};

use crate::graph::LinkFields;

/// Convert a finished page document to a link graph entry.
///
/// Documents without string outgoing links still get an entry so reindexing
/// clears their previous links.
pub fn page_to_link_doc(fields: &LinkFields, document: &Document) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    doc.add_text(fields.doc_id, document.id());

    if let Some(links) = document
        .get(field_names::OUTGOING_LINK)
        .and_then(|value| value.string_elements())
    {
        for link in links {
            doc.add_text(fields.outgoing_link, link);
        }
    }
    doc
}
