//! Size limiter error types.

use thiserror::Error;

/// Errors raised while loading truncation profiles.
#[derive(Debug, Error)]
pub enum LimiterError {
    /// Profile file is not valid TOML or does not match the profile shape
    #[error("Profile parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Profile values are inconsistent
    #[error("Invalid profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },
}
