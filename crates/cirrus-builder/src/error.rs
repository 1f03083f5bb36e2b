//! Error types for document construction.

use cirrus_search::SearchError;
use cirrus_types::{CirrusError, RevisionId};
use thiserror::Error;

/// Failure of an external source (page store, renderer, link index).
#[derive(Error, Debug)]
pub enum SourceError {
    /// Page or revision lookup failed
    #[error("Page store error: {0}")]
    PageStore(String),

    /// Rendering the revision failed
    #[error("Render error: {0}")]
    Render(String),

    /// Link graph query failed
    #[error("Link count error: {0}")]
    LinkCount(#[from] SearchError),
}

/// Errors that can occur while building documents
#[derive(Error, Debug)]
pub enum BuildError {
    /// Transient failure; the same call may succeed later
    #[error("Recoverable build failure: {message}")]
    Recoverable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Finalize was handed a revision other than the one the document was
    /// initialized with
    #[error("Revision mismatch for document {document}: built for {expected:?}, finalize got {supplied}")]
    RevisionMismatch {
        document: String,
        expected: Option<RevisionId>,
        supplied: RevisionId,
    },

    /// Malformed document hint
    #[error("Hint error: {0}")]
    Hint(#[from] CirrusError),

    /// Identifier outside the signed 64-bit range of index integer fields
    #[error("{field} {value} does not fit an index integer field")]
    IdOutOfRange { field: &'static str, value: u64 },
}

impl BuildError {
    /// Recoverable failure without an underlying cause.
    pub fn recoverable(message: impl Into<String>) -> Self {
        BuildError::Recoverable {
            message: message.into(),
            source: None,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BuildError::Recoverable { .. })
    }
}

/// Convert a page or revision id to the integer stored in the index.
pub(crate) fn indexable_id(field: &'static str, value: u64) -> Result<i64, BuildError> {
    i64::try_from(value).map_err(|_| BuildError::IdOutOfRange { field, value })
}

impl From<SourceError> for BuildError {
    fn from(err: SourceError) -> Self {
        BuildError::Recoverable {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = BuildError::recoverable("renderer timed out");
        assert_eq!(err.to_string(), "Recoverable build failure: renderer timed out");

        let err = BuildError::RevisionMismatch {
            document: "12".to_string(),
            expected: Some(5),
            supplied: 6,
        };
        assert_eq!(
            err.to_string(),
            "Revision mismatch for document 12: built for Some(5), finalize got 6"
        );
    }

    #[test]
    fn test_source_error_is_retryable_with_cause() {
        let err: BuildError = SourceError::Render("parser crashed".to_string()).into();
        assert!(err.is_retryable());
        assert_eq!(
            err.source().map(|cause| cause.to_string()),
            Some("Render error: parser crashed".to_string())
        );
    }

    #[test]
    fn test_fatal_errors_not_retryable() {
        let mismatch = BuildError::RevisionMismatch {
            document: "1".to_string(),
            expected: None,
            supplied: 2,
        };
        assert!(!mismatch.is_retryable());

        let hint: BuildError = CirrusError::InvalidHint {
            key: "builder_flags".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert!(!hint.is_retryable());
    }

    #[test]
    fn test_indexable_id_range() {
        assert_eq!(indexable_id("page_id", 42).unwrap(), 42);
        assert_eq!(indexable_id("page_id", i64::MAX as u64).unwrap(), i64::MAX);

        let err = indexable_id("version", u64::MAX).unwrap_err();
        assert!(matches!(
            err,
            BuildError::IdOutOfRange { field: "version", value: u64::MAX }
        ));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "version 18446744073709551615 does not fit an index integer field"
        );
    }
}
