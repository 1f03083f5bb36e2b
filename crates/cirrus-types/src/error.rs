//! Error types shared by the document build crates.

use thiserror::Error;

/// Unified error type for configuration and document model operations.
#[derive(Debug, Error)]
pub enum CirrusError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hint stored under a reserved key has an unexpected shape
    #[error("Invalid hint {key}: {reason}")]
    InvalidHint { key: String, reason: String },

    /// Named size limiter profile is not configured
    #[error("Unknown size limiter profile: {0}")]
    UnknownProfile(String),
}
