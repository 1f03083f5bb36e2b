//! Properties extracted from the rendered page.
//!
//! Rendering is the most expensive part of a build, so the extracted content
//! is cached under a key embedding the revision, the page's touched time and
//! the content schema version. Concurrent finalize attempts may render and
//! store the same entry; the last write wins.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cirrus_cache::{get_json, put_json, ContentCacheKey};
use cirrus_limiter::floor_char_boundary;
use cirrus_types::{field_names, Document, PageRef, Revision};

use crate::builder::{BuilderKind, PagePropertyBuilder};
use crate::context::BuildContext;
use crate::display_title::normalize_display_title;
use crate::error::BuildError;
use crate::extract::extract_text;
use crate::source::RenderedPage;

/// Content derived from one rendered revision, as stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub text: String,
    pub opening_text: Option<String>,
    pub auxiliary_text: Vec<String>,
    pub heading: Vec<String>,
    pub source_text: String,
    pub text_bytes: u64,
    pub category: Vec<String>,
    pub template: Vec<String>,
    pub outgoing_link: Vec<String>,
    pub external_link: Vec<String>,
    pub content_model: String,
    pub language: String,
    pub file_text: Option<String>,
    /// Raw display title; normalized when written to the document
    pub display_title: Option<String>,
    /// Source contained invalid UTF-8 and was repaired
    pub invalid_utf8: bool,
}

impl ExtractedContent {
    /// Derive the indexable content of a rendered page.
    pub fn from_rendered(rendered: RenderedPage) -> Self {
        let text = extract_text(&rendered.html);
        let text_bytes = rendered.source.len() as u64;
        let (source_text, invalid_utf8) = match String::from_utf8(rendered.source) {
            Ok(source) => (source, false),
            Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
        };

        Self {
            text: text.text,
            opening_text: text.opening_text,
            auxiliary_text: text.auxiliary_text,
            heading: text.heading,
            source_text,
            text_bytes,
            category: rendered.categories,
            template: rendered.templates,
            outgoing_link: rendered.outgoing_links,
            external_link: rendered.external_links,
            content_model: rendered.content_model,
            language: rendered.language,
            file_text: rendered.file_text,
            display_title: rendered.display_title,
            invalid_utf8,
        }
    }
}

/// Renders the revision and writes text, link and metadata fields.
pub struct RenderedContentProperties {
    context: BuildContext,
}

impl RenderedContentProperties {
    pub fn new(context: BuildContext) -> Self {
        Self { context }
    }

    fn content(&self, page: &PageRef, revision: &Revision) -> Result<ExtractedContent, BuildError> {
        let key = ContentCacheKey::for_page(
            page,
            revision.revision_id,
            self.context.settings.content_schema_version,
        );

        match get_json::<ExtractedContent>(self.context.cache.as_ref(), &key) {
            Ok(Some(content)) => {
                debug!(page_id = page.page_id, revision_id = revision.revision_id, "Content cache hit");
                return Ok(content);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(page_id = page.page_id, error = %e, "Content cache read failed, rendering");
            }
        }

        let rendered = self.context.renderer.render(page, revision)?;
        let content = ExtractedContent::from_rendered(rendered);

        let ttl = Duration::from_secs(self.context.settings.parser_cache_ttl_secs);
        if let Err(e) = put_json(self.context.cache.as_ref(), &key, &content, ttl) {
            warn!(page_id = page.page_id, error = %e, "Content cache write failed");
        }
        Ok(content)
    }
}

impl PagePropertyBuilder for RenderedContentProperties {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Rendered
    }

    fn initialize(
        &mut self,
        _document: &mut Document,
        _page: &PageRef,
        _revision: &Revision,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    fn finalize(
        &mut self,
        document: &mut Document,
        page: &PageRef,
        revision: &Revision,
        _slot: usize,
    ) -> Result<(), BuildError> {
        let content = self.content(page, revision)?;
        let settings = &self.context.settings;

        document.set(field_names::TEXT, content.text);
        match content.opening_text {
            Some(opening_text) => document.set(field_names::OPENING_TEXT, opening_text),
            None => {
                document.remove(field_names::OPENING_TEXT);
            }
        }
        document.set(field_names::AUXILIARY_TEXT, content.auxiliary_text);
        document.set(field_names::HEADING, content.heading);
        document.set(field_names::SOURCE_TEXT, content.source_text);
        document.set(
            field_names::TEXT_BYTES,
            i64::try_from(content.text_bytes).unwrap_or(i64::MAX),
        );
        document.set(field_names::CATEGORY, content.category);
        document.set(field_names::TEMPLATE, content.template);
        document.set(field_names::OUTGOING_LINK, content.outgoing_link);
        document.set(field_names::EXTERNAL_LINK, content.external_link);
        document.set(field_names::CONTENT_MODEL, content.content_model);
        document.set(field_names::LANGUAGE, content.language);

        let display_title = content.display_title.as_deref().and_then(|title| {
            normalize_display_title(title, page, self.context.namespaces.as_ref())
        });
        match display_title {
            Some(title) => document.set(field_names::DISPLAY_TITLE, title),
            None => {
                document.remove(field_names::DISPLAY_TITLE);
            }
        }

        if content.invalid_utf8 {
            warn!(page_id = page.page_id, revision_id = revision.revision_id, "Source contains invalid UTF-8");
            let field = settings.invalid_utf8_marker_field.as_str();
            let marker = settings.invalid_utf8_marker_value.as_str();
            let already_marked = document
                .get(field)
                .and_then(|value| value.string_elements())
                .is_some_and(|values| values.contains(&marker));
            if !already_marked && !document.append_to_list(field, marker) {
                warn!(page_id = page.page_id, field, "Cannot append invalid UTF-8 marker");
            }
        }

        // Last, so nothing above can grow it again
        match content.file_text {
            Some(mut file_text) => {
                if let Some(max) = settings.max_file_text_length {
                    file_text.truncate(floor_char_boundary(&file_text, max));
                }
                document.set(field_names::FILE_TEXT, file_text);
            }
            None => {
                document.remove(field_names::FILE_TEXT);
            }
        }
        Ok(())
    }
}
