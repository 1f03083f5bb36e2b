//! Out-of-band metadata attached to a document.
//!
//! Hints travel with a document through the retry queue but are never part
//! of the payload sent to the search index.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CirrusError;
use crate::flags::BuilderFlags;

/// Reserved key holding the builder flags used in the cheap build phase.
pub const BUILDER_FLAGS_HINT: &str = "builder_flags";

/// Reserved key holding the size limiter statistics of the last finalize.
pub const SIZE_LIMITER_STATS_HINT: &str = "size_limiter_stats";

/// Hint side-channel of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hints(BTreeMap<String, serde_json::Value>);

impl Hints {
    /// Create an empty hint map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw hint value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Decode a hint into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CirrusError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| CirrusError::InvalidHint {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Store a typed hint, replacing any previous value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CirrusError> {
        let value = serde_json::to_value(value)?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove a hint.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builder flags recorded by the cheap build phase.
    pub fn builder_flags(&self) -> Result<Option<BuilderFlags>, CirrusError> {
        let Some(bits) = self.get_as::<u8>(BUILDER_FLAGS_HINT)? else {
            return Ok(None);
        };
        BuilderFlags::from_bits(bits)
            .map(Some)
            .ok_or_else(|| CirrusError::InvalidHint {
                key: BUILDER_FLAGS_HINT.to_string(),
                reason: format!("unknown flag bits {}", bits),
            })
    }

    /// Record builder flags.
    pub fn set_builder_flags(&mut self, flags: BuilderFlags) {
        self.0
            .insert(BUILDER_FLAGS_HINT.to_string(), serde_json::Value::from(flags.bits()));
    }
}
