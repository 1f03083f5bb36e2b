//! End-to-end test infrastructure for the page document builder.
//!
//! Provides a shared TestHarness wiring an in-memory wiki to the persistent
//! content cache and the tantivy link graph, plus fixture helpers.

use std::sync::{Arc, Once};

use cirrus_builder::mock::{InMemoryNamespaces, InMemoryWiki};
use cirrus_builder::{BuildContext, BuildPipeline, RenderedPage};
use cirrus_cache::RocksContentCache;
use cirrus_search::{LinkGraph, LinkIndexer, LinkSearcher};
use cirrus_types::{Document, PageRef, Settings, SizeLimiterProfile, DEFAULT_PROFILE};

static TRACING: Once = Once::new();

/// Install a test subscriber once per process.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub settings: Settings,
    pub wiki: Arc<InMemoryWiki>,
    /// Content cache shared by every pipeline of the harness
    pub cache: Arc<RocksContentCache>,
    pub link_graph: LinkGraph,
    pub links: Arc<LinkSearcher>,
}

impl TestHarness {
    /// Create a harness with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create a harness with temp-dir backed cache and link index.
    pub fn with_settings(mut settings: Settings) -> Self {
        init_tracing(&settings.log_level);

        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let cache_path = temp_dir.path().join("content-cache");
        settings.content_cache_path = cache_path.to_string_lossy().to_string();

        let cache =
            Arc::new(RocksContentCache::open(&cache_path).expect("Failed to open content cache"));
        let link_graph =
            LinkGraph::open(temp_dir.path().join("links")).expect("Failed to open link graph");
        let links = Arc::new(LinkSearcher::new(&link_graph).expect("Failed to open link reader"));

        Self {
            _temp_dir: temp_dir,
            settings,
            wiki: Arc::new(InMemoryWiki::new()),
            cache,
            link_graph,
            links,
        }
    }

    /// Pipeline using the configured default profile.
    pub fn pipeline(&self) -> BuildPipeline {
        let profile = self
            .settings
            .profile(DEFAULT_PROFILE)
            .expect("Default profile missing")
            .clone();
        self.pipeline_with_profile(profile)
    }

    /// Pipeline over the harness sources with a specific profile.
    ///
    /// Every pipeline shares the wiki, cache and link graph, like workers
    /// of one cluster.
    pub fn pipeline_with_profile(&self, profile: SizeLimiterProfile) -> BuildPipeline {
        let context = BuildContext::new(
            &self.settings,
            self.wiki.clone(),
            self.wiki.clone(),
            Arc::new(InMemoryNamespaces::default()),
            self.links.clone(),
            self.cache.clone(),
        );
        BuildPipeline::new(context, profile)
    }

    /// Add finished documents to the link graph and make them searchable.
    pub fn index_links(&self, documents: &[Document]) {
        let indexer = LinkIndexer::new(&self.link_graph).expect("Failed to open link writer");
        indexer
            .index_documents(documents)
            .expect("Failed to index links");
        indexer.commit().expect("Failed to commit links");
        self.links.reload().expect("Failed to reload link reader");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered output of a simple article.
pub fn article(body: &str, links: &[&str]) -> RenderedPage {
    RenderedPage {
        html: format!(
            "<p>{}</p><table><tr><td>Infobox</td></tr></table><h2>History</h2><p>Later text.</p>",
            body
        ),
        source: body.as_bytes().to_vec(),
        content_model: "wikitext".to_string(),
        language: "en".to_string(),
        categories: vec!["Articles".to_string()],
        templates: vec!["Template:Infobox".to_string()],
        outgoing_links: links.iter().map(|l| l.to_string()).collect(),
        external_links: vec!["https://example.org".to_string()],
        ..RenderedPage::default()
    }
}

/// Seed a small wiki: three articles linking to each other and a redirect.
///
/// Returns the article pages in page id order.
pub fn seed_wiki(wiki: &InMemoryWiki) -> Vec<PageRef> {
    let rust = wiki.create_page(
        1,
        0,
        "Rust",
        101,
        article("Rust is a systems programming language.", &["Cargo"]),
    );
    let cargo = wiki.create_page(
        2,
        0,
        "Cargo",
        201,
        article("Cargo is the Rust package manager.", &["Rust", "Crates"]),
    );
    let crates = wiki.create_page(
        3,
        0,
        "Crates",
        301,
        article("A crate is a compilation unit.", &["Rust (language)"]),
    );
    wiki.add_redirect(
        1,
        PageRef::new(4, 0, "Rust (language)", 401, rust.touched),
    );
    vec![rust, cargo, crates]
}
