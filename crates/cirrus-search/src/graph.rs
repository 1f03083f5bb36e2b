//! The link graph: one tantivy document per page holding its outgoing links.
//!
//! - doc_id: the page document id, used to replace and to exclude a page
//! - outgoing_link: one untokenized term per link target
//!
//! Incoming link counts are term counts over `outgoing_link`; nothing else
//! about a page is stored.

use std::path::{Path, PathBuf};

use tantivy::schema::{Field, Schema, STORED, STRING};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::SearchError;

/// Writer heap in MB
const WRITER_MEMORY_MB: usize = 50;

/// Field handles of the link graph schema.
#[derive(Debug, Clone)]
pub struct LinkFields {
    pub doc_id: Field,
    pub outgoing_link: Field,
}

impl LinkFields {
    fn build() -> (Schema, Self) {
        let mut builder = Schema::builder();
        let doc_id = builder.add_text_field("doc_id", STRING | STORED);
        // Exact titles only, never tokenized
        let outgoing_link = builder.add_text_field("outgoing_link", STRING);
        (
            builder.build(),
            Self {
                doc_id,
                outgoing_link,
            },
        )
    }

    fn resolve(schema: &Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };
        Ok(Self {
            doc_id: field("doc_id")?,
            outgoing_link: field("outgoing_link")?,
        })
    }
}

/// Page link graph backed by a tantivy index.
pub struct LinkGraph {
    index: Index,
    fields: LinkFields,
    path: Option<PathBuf>,
}

impl LinkGraph {
    /// Open the graph stored under `path`, creating it when absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SearchError> {
        let path = path.into();
        let index = if path.join("meta.json").exists() {
            debug!(path = ?path, "Opening existing link graph");
            Index::open_in_dir(&path)?
        } else {
            info!(path = ?path, "Creating new link graph");
            std::fs::create_dir_all(&path)?;
            let (schema, _) = LinkFields::build();
            Index::create_in_dir(&path, schema)?
        };
        let fields = LinkFields::resolve(&index.schema())?;

        Ok(Self {
            index,
            fields,
            path: Some(path),
        })
    }

    /// Throwaway graph held in memory.
    pub fn in_ram() -> Self {
        let (schema, fields) = LinkFields::build();
        Self {
            index: Index::create_in_ram(schema),
            fields,
            path: None,
        }
    }

    pub fn fields(&self) -> &LinkFields {
        &self.fields
    }

    /// Graph directory, `None` for in-memory graphs
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn writer(&self) -> Result<IndexWriter, SearchError> {
        let writer = self.index.writer(WRITER_MEMORY_MB * 1024 * 1024)?;
        debug!(memory_mb = WRITER_MEMORY_MB, "Created link graph writer");
        Ok(writer)
    }

    pub(crate) fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(reader)
    }
}
