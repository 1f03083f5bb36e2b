//! Configuration loading for the document build pipeline.
//!
//! Layered config: defaults -> config file -> explicit file -> env vars.
//! The default config file lives at ~/.config/cirrus-build/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CirrusError;
use crate::profile::{FieldType, SizeLimiterProfile};

/// Name of the profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "default";

/// Settings for the property builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Maximum number of redirects stored on a document
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Lifetime of cached rendered content (seconds)
    #[serde(default = "default_parser_cache_ttl")]
    pub parser_cache_ttl_secs: u64,

    /// Bumped whenever the extracted content shape changes, invalidating
    /// every cached entry
    #[serde(default = "default_content_schema_version")]
    pub content_schema_version: u32,

    /// Cap on `file_text` in bytes; unlimited when unset
    #[serde(default)]
    pub max_file_text_length: Option<usize>,

    /// Field flagging documents whose source had invalid UTF-8
    #[serde(default = "default_invalid_utf8_marker_field")]
    pub invalid_utf8_marker_field: String,

    /// Value appended to the marker field
    #[serde(default = "default_invalid_utf8_marker_value")]
    pub invalid_utf8_marker_value: String,
}

fn default_max_redirects() -> usize {
    1024
}

fn default_parser_cache_ttl() -> u64 {
    3 * 60 * 60
}

fn default_content_schema_version() -> u32 {
    1
}

fn default_invalid_utf8_marker_field() -> String {
    "template".to_string()
}

fn default_invalid_utf8_marker_value() -> String {
    "Cirrus_Invalid_UTF8".to_string()
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            max_redirects: default_max_redirects(),
            parser_cache_ttl_secs: default_parser_cache_ttl(),
            content_schema_version: default_content_schema_version(),
            max_file_text_length: None,
            invalid_utf8_marker_field: default_invalid_utf8_marker_field(),
            invalid_utf8_marker_value: default_invalid_utf8_marker_value(),
        }
    }
}

impl BuildSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.parser_cache_ttl_secs == 0 {
            return Err("parser_cache_ttl_secs must be > 0".to_string());
        }
        if self.invalid_utf8_marker_field.is_empty() {
            return Err("invalid_utf8_marker_field must not be empty".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Wiki identifier written to every document
    #[serde(default = "default_wiki_id")]
    pub wiki_id: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path of the persistent rendered-content cache
    #[serde(default = "default_content_cache_path")]
    pub content_cache_path: String,

    /// Builder settings
    #[serde(default)]
    pub build: BuildSettings,

    /// Named size limiter profiles
    #[serde(default)]
    pub size_limiter_profiles: IndexMap<String, SizeLimiterProfile>,
}

fn default_wiki_id() -> String {
    "wiki".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_content_cache_path() -> String {
    ProjectDirs::from("", "", "cirrus-build")
        .map(|p| p.cache_dir().join("content"))
        .unwrap_or_else(|| PathBuf::from("./content-cache"))
        .to_string_lossy()
        .to_string()
}

/// Profile used when the configuration declares none.
pub fn default_size_limiter_profile() -> SizeLimiterProfile {
    SizeLimiterProfile::new(4_000_000)
        .with_field_type("category", FieldType::Keyword)
        .with_field_type("template", FieldType::Keyword)
        .with_field_type("outgoing_link", FieldType::Keyword)
        .with_field_type("external_link", FieldType::Keyword)
        .with_max_field_size("file_text", 1_048_576)
        .with_field("file_text", 0)
        .with_field("auxiliary_text", 1024)
        .with_field("external_link", 0)
        .with_field("outgoing_link", 0)
        .with_field("source_text", 8192)
        .with_field("text", 16384)
        .with_field("heading", 512)
        .with_markup_template("Cirrus_Oversize")
}

impl Default for Settings {
    fn default() -> Self {
        let mut size_limiter_profiles = IndexMap::new();
        size_limiter_profiles.insert(DEFAULT_PROFILE.to_string(), default_size_limiter_profile());
        Self {
            wiki_id: default_wiki_id(),
            log_level: default_log_level(),
            content_cache_path: default_content_cache_path(),
            build: BuildSettings::default(),
            size_limiter_profiles,
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/cirrus-build/config.toml)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (CIRRUS_*, nested keys joined by `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self, CirrusError> {
        let config_dir = ProjectDirs::from("", "", "cirrus-build")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("wiki_id", default_wiki_id())
            .map_err(|e| CirrusError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| CirrusError::Config(e.to_string()))?
            .set_default("content_cache_path", default_content_cache_path())
            .map_err(|e| CirrusError::Config(e.to_string()))?
            .set_default("build.max_redirects", default_max_redirects() as i64)
            .map_err(|e| CirrusError::Config(e.to_string()))?
            .set_default("build.parser_cache_ttl_secs", default_parser_cache_ttl() as i64)
            .map_err(|e| CirrusError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CIRRUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| CirrusError::Config(e.to_string()))?;

        let mut settings: Settings = config
            .try_deserialize()
            .map_err(|e| CirrusError::Config(e.to_string()))?;

        if settings.size_limiter_profiles.is_empty() {
            settings
                .size_limiter_profiles
                .insert(DEFAULT_PROFILE.to_string(), default_size_limiter_profile());
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), CirrusError> {
        self.build.validate().map_err(CirrusError::Config)?;
        for (name, profile) in &self.size_limiter_profiles {
            profile
                .validate()
                .map_err(|e| CirrusError::Config(format!("profile {}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Look up a named size limiter profile.
    pub fn profile(&self, name: &str) -> Result<&SizeLimiterProfile, CirrusError> {
        self.size_limiter_profiles
            .get(name)
            .ok_or_else(|| CirrusError::UnknownProfile(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.wiki_id, "wiki");
        assert_eq!(settings.build.max_redirects, 1024);
        assert_eq!(settings.build.parser_cache_ttl_secs, 10800);
        assert!(settings.profile(DEFAULT_PROFILE).is_ok());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.build.content_schema_version, 1);
        assert!(settings.profile(DEFAULT_PROFILE).is_ok());
    }

    #[test]
    fn test_load_profiles_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profiles.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
wiki_id = "enwiki"

[build]
max_redirects = 10

[size_limiter_profiles.small]
max_size = 2048
markup_template = "Oversize"

[size_limiter_profiles.small.fields]
text = 100
heading = 0
"#
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.wiki_id, "enwiki");
        assert_eq!(settings.build.max_redirects, 10);

        let small = settings.profile("small").unwrap();
        assert_eq!(small.max_size, 2048);
        let order: Vec<&str> = small.fields.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["text", "heading"]);
        assert!(settings.profile(DEFAULT_PROFILE).is_err());
    }

    #[test]
    fn test_unknown_profile() {
        let settings = Settings::default();
        assert!(matches!(
            settings.profile("missing"),
            Err(CirrusError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_build_settings_validation() {
        let mut build = BuildSettings::default();
        assert!(build.validate().is_ok());
        build.parser_cache_ttl_secs = 0;
        assert!(build.validate().is_err());
    }
}
