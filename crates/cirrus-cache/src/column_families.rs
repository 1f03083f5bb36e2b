//! Column family definitions for the persistent content cache.
//!
//! - parsed_content: rendered page content, keyed by `ContentCacheKey`

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for rendered page content
pub const CF_PARSED_CONTENT: &str = "parsed_content";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_PARSED_CONTENT];

/// Rendered content is large text, compress it
fn parsed_content_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![ColumnFamilyDescriptor::new(
        CF_PARSED_CONTENT,
        parsed_content_options(),
    )]
}
