//! End-to-end build tests: initialize, queue, finalize and link counts.

use pretty_assertions::assert_eq;
use serde_json::json;

use cirrus_types::{field_names, BuildEntry, BuilderFlags, Document, FieldValue};
use e2e_tests::{article, seed_wiki, TestHarness};

fn entries(pages: &[cirrus_types::PageRef]) -> Vec<BuildEntry> {
    pages.iter().cloned().map(BuildEntry::Page).collect()
}

fn incoming(document: &Document) -> Option<i64> {
    document
        .get(field_names::INCOMING_LINKS)
        .and_then(FieldValue::as_i64)
}

#[test]
fn test_full_build_of_small_wiki() {
    let harness = TestHarness::new();
    let pages = seed_wiki(&harness.wiki);
    let pipeline = harness.pipeline();

    let mut documents: Vec<Document> = pipeline
        .initialize(&entries(&pages), BuilderFlags::INDEX_EVERYTHING)
        .unwrap()
        .into_values()
        .collect();
    assert_eq!(documents.len(), 3);

    let accepted = pipeline.finalize_batch(&mut documents, true).unwrap();
    assert_eq!(accepted, vec![true, true, true]);

    let rust = &documents[0];
    assert_eq!(rust.id(), "1");
    assert!(rust.upsert());
    assert_eq!(
        rust.get(field_names::TITLE).and_then(FieldValue::as_str),
        Some("Rust")
    );
    assert_eq!(
        rust.get(field_names::OPENING_TEXT).and_then(FieldValue::as_str),
        Some("Rust is a systems programming language.")
    );
    assert_eq!(
        rust.get(field_names::HEADING),
        Some(&FieldValue::strings(["History"]))
    );
    assert_eq!(
        rust.get(field_names::AUXILIARY_TEXT),
        Some(&FieldValue::strings(["Infobox"]))
    );
    let text = rust.get(field_names::TEXT).and_then(FieldValue::as_str).unwrap();
    assert!(text.contains("systems programming language"));
    assert!(text.contains("Later text."));
    assert!(!text.contains("Infobox"));
    assert_eq!(
        rust.get(field_names::REDIRECT),
        Some(&FieldValue::Nested(json!([{"namespace": 0, "title": "Rust (language)"}])))
    );

    // Empty link graph: only the redirect counts
    assert_eq!(incoming(&documents[0]), Some(1));
    assert_eq!(incoming(&documents[1]), Some(0));
    assert_eq!(incoming(&documents[2]), Some(0));
}

#[test]
fn test_incoming_links_from_link_graph() {
    let harness = TestHarness::new();
    let pages = seed_wiki(&harness.wiki);
    let pipeline = harness.pipeline();

    let mut documents: Vec<Document> = pipeline
        .initialize(&entries(&pages), BuilderFlags::INDEX_EVERYTHING)
        .unwrap()
        .into_values()
        .collect();
    pipeline.finalize_batch(&mut documents, true).unwrap();
    harness.index_links(&documents);
    assert_eq!(harness.links.num_docs(), 3);

    let mut rebuilt: Vec<Document> = pipeline
        .initialize(&entries(&pages), BuilderFlags::SKIP_PARSE)
        .unwrap()
        .into_values()
        .collect();
    pipeline.finalize_batch(&mut rebuilt, true).unwrap();

    // Rust: linked from Cargo by title and from Crates through its redirect
    assert_eq!(incoming(&rebuilt[0]), Some(3));
    assert_eq!(incoming(&rebuilt[1]), Some(1));
    assert_eq!(incoming(&rebuilt[2]), Some(1));
    assert!(!rebuilt[0].contains(field_names::TEXT));
    assert!(!rebuilt[0].upsert());
}

#[test]
fn test_queued_document_finalized_by_another_worker() {
    let harness = TestHarness::new();
    let pages = seed_wiki(&harness.wiki);

    let producer = harness.pipeline();
    let documents = producer
        .initialize(&entries(&pages[..1]), BuilderFlags::INDEX_EVERYTHING)
        .unwrap();
    let queued = documents[&1].to_queue_bytes().unwrap();

    // Two clusters pick up the same job and share the content cache
    let mut first = Document::from_queue_bytes(&queued).unwrap();
    assert!(harness.pipeline().finalize(&mut first, true, None).unwrap());
    let mut second = Document::from_queue_bytes(&queued).unwrap();
    assert!(harness.pipeline().finalize(&mut second, true, None).unwrap());

    assert_eq!(harness.wiki.render_count(), 1);
    assert_eq!(first.index_payload().unwrap(), second.index_payload().unwrap());
    assert_eq!(first.id(), "1");
}

#[test]
fn test_retry_after_transient_render_failure() {
    let harness = TestHarness::new();
    let pages = seed_wiki(&harness.wiki);
    let pipeline = harness.pipeline();
    let documents = pipeline
        .initialize(&entries(&pages[1..2]), BuilderFlags::INDEX_EVERYTHING)
        .unwrap();
    let queued = documents[&2].to_queue_bytes().unwrap();

    harness.wiki.set_fail_renders(true);
    let mut attempt = Document::from_queue_bytes(&queued).unwrap();
    let err = pipeline.finalize(&mut attempt, true, None).unwrap_err();
    assert!(err.is_retryable());

    harness.wiki.set_fail_renders(false);
    let mut retry = Document::from_queue_bytes(&queued).unwrap();
    assert!(pipeline.finalize(&mut retry, true, None).unwrap());
    assert!(retry.contains(field_names::TEXT));
}

#[test]
fn test_edit_between_phases_drops_stale_job() {
    let harness = TestHarness::new();
    let pages = seed_wiki(&harness.wiki);
    let pipeline = harness.pipeline();

    let mut stale = pipeline
        .initialize(&entries(&pages[..1]), BuilderFlags::INDEX_EVERYTHING)
        .unwrap()
        .remove(&1)
        .unwrap();
    let edited = harness
        .wiki
        .edit_page(1, 102, article("Rust is a language empowering everyone.", &[]))
        .unwrap();

    assert!(!pipeline.finalize(&mut stale, true, None).unwrap());

    let mut fresh = pipeline
        .initialize(&[BuildEntry::Page(edited)], BuilderFlags::INDEX_EVERYTHING)
        .unwrap()
        .remove(&1)
        .unwrap();
    assert!(pipeline.finalize(&mut fresh, true, None).unwrap());
    assert_eq!(fresh.version(), Some(102));
    assert_eq!(
        fresh.get(field_names::SOURCE_TEXT).and_then(FieldValue::as_str),
        Some("Rust is a language empowering everyone.")
    );
}

#[test]
fn test_redirects_capped_by_settings() {
    let mut settings = cirrus_types::Settings::default();
    settings.build.max_redirects = 2;
    let harness = TestHarness::with_settings(settings);
    let pages = seed_wiki(&harness.wiki);
    for (i, title) in ["Rustlang", "Rust language", "Rust (programming)"].iter().enumerate() {
        let redirect = cirrus_types::PageRef::new(10 + i as u64, 0, *title, 500, pages[0].touched);
        harness.wiki.add_redirect(1, redirect);
    }
    let pipeline = harness.pipeline();

    let mut document = pipeline
        .initialize(&entries(&pages[..1]), BuilderFlags::INDEX_EVERYTHING)
        .unwrap()
        .remove(&1)
        .unwrap();
    assert!(pipeline.finalize(&mut document, true, None).unwrap());

    match document.get(field_names::REDIRECT) {
        Some(FieldValue::Nested(redirects)) => {
            assert_eq!(redirects.as_array().map(Vec::len), Some(2));
        }
        other => panic!("unexpected redirect field: {:?}", other),
    }
    assert_eq!(incoming(&document), Some(2));
}
