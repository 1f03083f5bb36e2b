//! Statistics reported by the size limiter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Truncation pass a reduction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Unconditional per-field caps
    Mandatory,
    /// Reductions made only because the document was over budget
    Oversize,
}

/// Bytes removed per field and pass, with estimated document sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimiterStats {
    /// Estimated serialized size before truncation
    pub original_size: usize,
    /// Estimated serialized size after truncation
    pub final_size: usize,
    /// Bytes removed by the mandatory pass, per field
    #[serde(default)]
    pub mandatory: BTreeMap<String, usize>,
    /// Bytes removed by the oversize pass, per field
    #[serde(default)]
    pub oversize: BTreeMap<String, usize>,
}

impl SizeLimiterStats {
    /// Start stats for a document of the given estimated size.
    pub fn new(original_size: usize) -> Self {
        Self {
            original_size,
            final_size: original_size,
            ..Self::default()
        }
    }

    /// Record bytes removed from a field.
    pub fn record(&mut self, pass: Pass, field: &str, removed: usize) {
        if removed == 0 {
            return;
        }
        let bucket = match pass {
            Pass::Mandatory => &mut self.mandatory,
            Pass::Oversize => &mut self.oversize,
        };
        *bucket.entry(field.to_string()).or_insert(0) += removed;
    }

    /// Total bytes removed by one pass.
    pub fn removed(&self, pass: Pass) -> usize {
        match pass {
            Pass::Mandatory => self.mandatory.values().sum(),
            Pass::Oversize => self.oversize.values().sum(),
        }
    }

    /// True when any field was shortened.
    pub fn truncated(&self) -> bool {
        !self.mandatory.is_empty() || !self.oversize.is_empty()
    }
}
