//! Named truncation profiles loaded from TOML.

use indexmap::IndexMap;
use serde::Deserialize;

use cirrus_types::SizeLimiterProfile;

use crate::error::LimiterError;

/// A set of named profiles, one TOML table per profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet(IndexMap<String, SizeLimiterProfile>);

impl ProfileSet {
    /// Parse and validate profiles from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, LimiterError> {
        let set: ProfileSet = toml::from_str(text)?;
        for (name, profile) in &set.0 {
            profile
                .validate()
                .map_err(|reason| LimiterError::InvalidProfile {
                    name: name.clone(),
                    reason,
                })?;
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&SizeLimiterProfile> {
        self.0.get(name)
    }

    /// Profile names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> IndexMap<String, SizeLimiterProfile> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_types::FieldType;

    const PROFILES: &str = r#"
[default]
max_size = 4000000
markup_template = "Cirrus_Oversize"

[default.field_types]
category = "keyword"
text = "text"

[default.max_field_size]
file_text = 51200

[default.fields]
file_text = 0
auxiliary_text = 512
text = 4096

[tiny]
max_size = 1024
"#;

    #[test]
    fn test_parse_profiles() {
        let set = ProfileSet::from_toml_str(PROFILES).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["default", "tiny"]);

        let default = set.get("default").unwrap();
        assert_eq!(default.max_size, 4_000_000);
        assert_eq!(default.field_type("category"), FieldType::Keyword);
        assert_eq!(default.max_field_size.get("file_text"), Some(&51200));
        let order: Vec<&str> = default.fields.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["file_text", "auxiliary_text", "text"]);
        assert_eq!(default.markup_template.as_deref(), Some("Cirrus_Oversize"));

        let tiny = set.get("tiny").unwrap();
        assert!(tiny.fields.is_empty());
        assert_eq!(tiny.markup_field, "template");
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let err = ProfileSet::from_toml_str("[broken]\nmax_size = 0\n").unwrap_err();
        assert!(matches!(err, LimiterError::InvalidProfile { .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = ProfileSet::from_toml_str("[broken\nmax_size = ").unwrap_err();
        assert!(matches!(err, LimiterError::Parse(_)));
    }
}
