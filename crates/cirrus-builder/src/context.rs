//! Shared handles passed to every property builder.

use std::sync::Arc;

use cirrus_cache::ContentCache;
use cirrus_types::{BuildSettings, Settings};

use crate::source::{LinkCounter, NamespaceResolver, PageStore, Renderer};

/// Sources, cache and settings for one wiki.
#[derive(Clone)]
pub struct BuildContext {
    pub wiki_id: String,
    pub settings: BuildSettings,
    pub pages: Arc<dyn PageStore>,
    pub renderer: Arc<dyn Renderer>,
    pub namespaces: Arc<dyn NamespaceResolver>,
    pub links: Arc<dyn LinkCounter>,
    pub cache: Arc<dyn ContentCache>,
}

impl BuildContext {
    pub fn new(
        settings: &Settings,
        pages: Arc<dyn PageStore>,
        renderer: Arc<dyn Renderer>,
        namespaces: Arc<dyn NamespaceResolver>,
        links: Arc<dyn LinkCounter>,
        cache: Arc<dyn ContentCache>,
    ) -> Self {
        Self {
            wiki_id: settings.wiki_id.clone(),
            settings: settings.build.clone(),
            pages,
            renderer,
            namespaces,
            links,
            cache,
        }
    }
}
