//! Incoming link counting over the link graph.

use tantivy::collector::Count;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{IndexReader, Searcher, Term};
use tracing::debug;

use crate::error::SearchError;
use crate::graph::{LinkFields, LinkGraph};

/// Count of pages linking to any of `titles`, excluding the page itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingLinkQuery {
    /// Document id of the linked page; its own links are not counted
    pub doc_id: String,
    /// Prefixed titles the page is reachable by (its own and redirects)
    pub titles: Vec<String>,
}

impl IncomingLinkQuery {
    pub fn new(doc_id: impl Into<String>, titles: Vec<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            titles,
        }
    }
}

/// Read side of the link graph.
pub struct LinkSearcher {
    reader: IndexReader,
    fields: LinkFields,
}

impl LinkSearcher {
    pub fn new(graph: &LinkGraph) -> Result<Self, SearchError> {
        Ok(Self {
            reader: graph.reader()?,
            fields: graph.fields().clone(),
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded link reader");
        Ok(())
    }

    /// Resolve many incoming link counts against one searcher snapshot.
    ///
    /// Results are in the order of `queries`.
    pub fn count_incoming(&self, queries: &[IncomingLinkQuery]) -> Result<Vec<u64>, SearchError> {
        let searcher = self.reader.searcher();
        let counts = queries
            .iter()
            .map(|query| self.count(&searcher, query))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(queries = queries.len(), "Counted incoming links");
        Ok(counts)
    }

    fn count(&self, searcher: &Searcher, query: &IncomingLinkQuery) -> Result<u64, SearchError> {
        if query.titles.is_empty() {
            return Ok(0);
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = query
            .titles
            .iter()
            .map(|title| {
                let term = Term::from_field_text(self.fields.outgoing_link, title);
                let clause: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Should, clause)
            })
            .collect();
        let own_page = Term::from_field_text(self.fields.doc_id, &query.doc_id);
        clauses.push((
            Occur::MustNot,
            Box::new(TermQuery::new(own_page, IndexRecordOption::Basic)),
        ));

        let count = searcher.search(&BooleanQuery::new(clauses), &Count)?;
        Ok(count as u64)
    }

    /// Get the number of indexed pages.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
