//! Indexer adding finished page documents to the link graph.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until commit() is called.

use std::sync::{Arc, Mutex};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info};

use cirrus_types::Document;

use crate::document::page_to_link_doc;
use crate::error::SearchError;
use crate::graph::{LinkFields, LinkGraph};

/// Manages link graph updates.
pub struct LinkIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    fields: LinkFields,
}

impl LinkIndexer {
    pub fn new(graph: &LinkGraph) -> Result<Self, SearchError> {
        Ok(Self {
            writer: Arc::new(Mutex::new(graph.writer()?)),
            fields: graph.fields().clone(),
        })
    }

    /// Add page documents, replacing any entry with the same document id.
    ///
    /// Returns the number of documents written.
    pub fn index_documents(&self, documents: &[Document]) -> Result<usize, SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        for document in documents {
            writer.delete_term(Term::from_field_text(self.fields.doc_id, document.id()));
            writer.add_document(page_to_link_doc(&self.fields, document))?;
        }

        debug!(count = documents.len(), "Indexed page links batch");
        Ok(documents.len())
    }

    /// Commit pending changes to make them searchable.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        info!(opstamp, "Committed link index changes");
        Ok(opstamp)
    }
}
