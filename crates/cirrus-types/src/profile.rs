//! Truncation profile consumed by the size limiter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a field may be shortened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text, cut character-wise from the end
    #[default]
    Text,
    /// Atomic tokens, only whole elements are dropped
    Keyword,
}

fn default_markup_field() -> String {
    "template".to_string()
}

/// Size limits and per-field truncation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimiterProfile {
    /// Target serialized size of the document in bytes
    pub max_size: usize,

    /// Field types; unlisted fields are treated as text
    #[serde(default)]
    pub field_types: IndexMap<String, FieldType>,

    /// Hard per-field caps, applied unconditionally
    #[serde(default)]
    pub max_field_size: IndexMap<String, usize>,

    /// Minimum retained size per field, applied in declaration order while
    /// the document is still oversize
    #[serde(default)]
    pub fields: IndexMap<String, usize>,

    /// Marker appended when the oversize pass truncated something
    #[serde(default)]
    pub markup_template: Option<String>,

    /// List field receiving the marker
    #[serde(default = "default_markup_field")]
    pub markup_field: String,
}

impl SizeLimiterProfile {
    /// Create a profile with only a size budget.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            field_types: IndexMap::new(),
            max_field_size: IndexMap::new(),
            fields: IndexMap::new(),
            markup_template: None,
            markup_field: default_markup_field(),
        }
    }

    /// Declare a field type.
    pub fn with_field_type(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
        self.field_types.insert(field.into(), field_type);
        self
    }

    /// Add a hard cap for a field.
    pub fn with_max_field_size(mut self, field: impl Into<String>, cap: usize) -> Self {
        self.max_field_size.insert(field.into(), cap);
        self
    }

    /// Append a field to the oversize pass with its minimum retained size.
    pub fn with_field(mut self, field: impl Into<String>, min_size: usize) -> Self {
        self.fields.insert(field.into(), min_size);
        self
    }

    /// Set the oversize marker.
    pub fn with_markup_template(mut self, template: impl Into<String>) -> Self {
        self.markup_template = Some(template.into());
        self
    }

    /// Type of a field, text when undeclared.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.field_types.get(field).copied().unwrap_or_default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("max_size must be > 0".to_string());
        }
        if self.markup_template.is_some() && self.markup_field.is_empty() {
            return Err("markup_field must be set when markup_template is".to_string());
        }
        Ok(())
    }
}
