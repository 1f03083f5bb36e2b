//! # cirrus-search
//!
//! Link graph for incoming link counts using Tantivy.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence, or in RAM
//! - One entry per page holding its exact outgoing link targets
//! - Batched incoming link counts against a single searcher snapshot

pub mod document;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod searcher;

pub use document::page_to_link_doc;
pub use error::SearchError;
pub use graph::{LinkFields, LinkGraph};
pub use indexer::LinkIndexer;
pub use searcher::{IncomingLinkQuery, LinkSearcher};
