//! Two-pass document size limiter.
//!
//! Pass 1 applies the profile's hard per-field caps unconditionally. Pass 2
//! runs only while the estimated document size exceeds the profile budget:
//! fields are truncated toward their minimum, in declaration order, until
//! the running estimate fits. When the profile has a markup template, pass 2
//! also makes room for the marker it appends.
//!
//! Size accounting is incremental: the document is serialized once up front
//! and every truncation subtracts the bytes it removed. The marker's cost
//! includes its JSON punctuation; escaping inside truncated strings is
//! ignored.

use tracing::{debug, warn};

use cirrus_types::{Document, FieldValue, Scalar, SizeLimiterProfile, SIZE_LIMITER_STATS_HINT};

use crate::stats::{Pass, SizeLimiterStats};
use crate::truncate::{truncate_field, Bound};

/// Estimated serialized size of a document's index payload.
///
/// Serialization failures count as size 0 so an estimation glitch never
/// fails the build.
pub fn estimate_size(document: &Document) -> usize {
    match document.index_payload() {
        Ok(bytes) => bytes.len(),
        Err(e) => {
            warn!(doc_id = %document.id(), error = %e, "Failed to estimate document size");
            0
        }
    }
}

/// Size limiter bound to one truncation profile.
#[derive(Debug, Clone)]
pub struct SizeLimiter {
    profile: SizeLimiterProfile,
}

impl SizeLimiter {
    pub fn new(profile: SizeLimiterProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SizeLimiterProfile {
        &self.profile
    }

    /// Resize a document in place. See [`resize`].
    pub fn resize(&self, document: &mut Document) -> SizeLimiterStats {
        resize(document, &self.profile)
    }
}

/// Truncate `document` to fit `profile` and record the stats as a hint.
pub fn resize(document: &mut Document, profile: &SizeLimiterProfile) -> SizeLimiterStats {
    let original_size = estimate_size(document);
    let mut stats = SizeLimiterStats::new(original_size);
    let mut size = original_size;

    for (field, cap) in &profile.max_field_size {
        let removed = truncate_in_place(
            document,
            field,
            profile,
            *cap,
            usize::MAX,
            Bound::Cap,
        );
        stats.record(Pass::Mandatory, field, removed);
        size = size.saturating_sub(removed);
    }

    if size > profile.max_size {
        debug!(
            doc_id = %document.id(),
            size,
            max_size = profile.max_size,
            "Document oversize, truncating"
        );

        let marker_bytes = profile
            .markup_template
            .as_deref()
            .map_or(0, |marker| marker_cost(document, &profile.markup_field, marker));
        let budget = profile.max_size.saturating_sub(marker_bytes);

        for (field, min_size) in &profile.fields {
            if size <= budget {
                break;
            }
            let removed = truncate_in_place(
                document,
                field,
                profile,
                *min_size,
                size - budget,
                Bound::Floor,
            );
            stats.record(Pass::Oversize, field, removed);
            size = size.saturating_sub(removed);
        }

        if !stats.oversize.is_empty() {
            if let Some(marker) = &profile.markup_template {
                size += append_marker(document, &profile.markup_field, marker);
            }
        }
    }

    stats.final_size = size;

    if let Err(e) = document.hints_mut().set(SIZE_LIMITER_STATS_HINT, &stats) {
        warn!(doc_id = %document.id(), error = %e, "Failed to record size limiter stats");
    }

    if stats.truncated() {
        debug!(
            doc_id = %document.id(),
            original_size = stats.original_size,
            final_size = stats.final_size,
            mandatory = stats.removed(Pass::Mandatory),
            oversize = stats.removed(Pass::Oversize),
            "Truncated document"
        );
    }

    stats
}

fn truncate_in_place(
    document: &mut Document,
    field: &str,
    profile: &SizeLimiterProfile,
    target: usize,
    max_removal: usize,
    bound: Bound,
) -> usize {
    let Some(value) = document.get_mut(field) else {
        return 0;
    };
    match truncate_field(value, profile.field_type(field), target, max_removal, bound) {
        Some(truncated) => {
            *value = truncated.value;
            truncated.removed
        }
        None => 0,
    }
}

/// Estimated bytes appending `marker` to `field` would add.
///
/// Zero when the marker is already present or the field cannot take it.
fn marker_cost(document: &Document, field: &str, marker: &str) -> usize {
    match document.get(field) {
        // ,"field":["marker"]
        None => field.len() + marker.len() + 8,
        Some(FieldValue::Scalar(Scalar::Str(existing))) if existing == marker => 0,
        // promoted to a list: brackets plus ,"marker"
        Some(FieldValue::Scalar(Scalar::Str(_))) => marker.len() + 5,
        Some(FieldValue::List(items)) if items.iter().any(|item| item.as_str() == Some(marker)) => 0,
        Some(FieldValue::List(items)) if items.is_empty() => marker.len() + 2,
        Some(FieldValue::List(_)) => marker.len() + 3,
        Some(_) => 0,
    }
}

/// Append the oversize marker once; returns the estimated bytes added.
fn append_marker(document: &mut Document, field: &str, marker: &str) -> usize {
    let cost = marker_cost(document, field, marker);
    if cost == 0 {
        return 0;
    }
    if document.append_to_list(field, marker) {
        cost
    } else {
        warn!(doc_id = %document.id(), field, "Cannot append oversize marker to non-list field");
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_types::FieldType;

    fn payload_len(doc: &Document) -> usize {
        doc.index_payload().unwrap().len()
    }

    #[test]
    fn test_body_scenario_fits_budget() {
        let original = "a".repeat(200);
        let mut doc = Document::for_page(1);
        doc.set("body", original.clone());

        let profile = SizeLimiterProfile::new(100).with_field("body", 0);
        let stats = resize(&mut doc, &profile);

        assert!(payload_len(&doc) <= 100);
        let body = doc.get("body").and_then(FieldValue::as_str).unwrap();
        assert!(original.starts_with(body));
        assert!(!body.is_empty());
        assert_eq!(stats.original_size, 211);
        assert_eq!(stats.final_size, 100);
        assert_eq!(stats.oversize.get("body"), Some(&111));
    }

    #[test]
    fn test_mandatory_cap_applies_under_budget() {
        let mut doc = Document::for_page(1);
        doc.set("file_text", "x".repeat(50));

        let profile = SizeLimiterProfile::new(1_000_000).with_max_field_size("file_text", 10);
        let stats = resize(&mut doc, &profile);

        assert_eq!(doc.get("file_text").and_then(FieldValue::as_str).map(str::len), Some(10));
        assert_eq!(stats.mandatory.get("file_text"), Some(&40));
        assert!(stats.oversize.is_empty());
    }

    #[test]
    fn test_oversize_pass_stops_once_within_budget() {
        let mut doc = Document::for_page(1);
        doc.set("a", "a".repeat(100));
        doc.set("b", "b".repeat(100));

        // {"a":"...","b":"..."} = 215 bytes; shedding 65 from `a` is enough
        let profile = SizeLimiterProfile::new(150).with_field("a", 0).with_field("b", 0);
        let stats = resize(&mut doc, &profile);

        assert_eq!(stats.oversize.get("a"), Some(&65));
        assert!(!stats.oversize.contains_key("b"));
        assert_eq!(doc.get("b").and_then(FieldValue::as_str).map(str::len), Some(100));
        assert!(payload_len(&doc) <= 150);
    }

    #[test]
    fn test_oversize_pass_respects_minimum() {
        let mut doc = Document::for_page(1);
        doc.set("text", "t".repeat(300));
        doc.set("heading", "h".repeat(300));

        let profile = SizeLimiterProfile::new(100)
            .with_field("text", 120)
            .with_field("heading", 50);
        resize(&mut doc, &profile);

        assert_eq!(doc.get("text").and_then(FieldValue::as_str).map(str::len), Some(120));
        assert_eq!(doc.get("heading").and_then(FieldValue::as_str).map(str::len), Some(50));
    }

    #[test]
    fn test_keyword_elements_never_partially_cut() {
        let original = ["Category one", "Category two", "Category three", "Category four"];
        let mut doc = Document::for_page(1);
        doc.set("category", FieldValue::strings(original));

        let profile = SizeLimiterProfile::new(40)
            .with_field_type("category", FieldType::Keyword)
            .with_field("category", 0);
        resize(&mut doc, &profile);

        let remaining = doc.get("category").unwrap().string_elements().unwrap();
        assert!(remaining.len() < original.len());
        for element in remaining {
            assert!(original.contains(&element));
        }
    }

    #[test]
    fn test_mixed_list_left_untouched() {
        let mixed = FieldValue::List(vec![Scalar::from("x".repeat(100)), Scalar::Int(5)]);
        let mut doc = Document::for_page(1);
        doc.set("mixed", mixed.clone());

        let profile = SizeLimiterProfile::new(10)
            .with_max_field_size("mixed", 1)
            .with_field("mixed", 0);
        let stats = resize(&mut doc, &profile);

        assert_eq!(doc.get("mixed"), Some(&mixed));
        assert!(!stats.truncated());
    }

    #[test]
    fn test_markup_template_added_once() {
        let mut doc = Document::for_page(1);
        doc.set("text", "z".repeat(500));
        doc.set("template", FieldValue::strings(["Template:Infobox"]));

        let profile = SizeLimiterProfile::new(200)
            .with_field("text", 0)
            .with_markup_template("Oversize");
        resize(&mut doc, &profile);

        let templates = doc.get("template").unwrap().string_elements().unwrap();
        assert_eq!(templates.iter().filter(|t| **t == "Oversize").count(), 1);

        // Already marked documents are not marked again
        doc.set("text", "z".repeat(500));
        resize(&mut doc, &profile);
        let templates = doc.get("template").unwrap().string_elements().unwrap();
        assert_eq!(templates.iter().filter(|t| **t == "Oversize").count(), 1);
    }

    #[test]
    fn test_markup_fits_budget_and_second_pass_is_noop() {
        let mut doc = Document::for_page(1);
        doc.set("text", "z".repeat(500));
        doc.set("template", FieldValue::strings(["Template:Infobox"]));

        let profile = SizeLimiterProfile::new(200)
            .with_field("text", 0)
            .with_markup_template("Oversize");
        let first = resize(&mut doc, &profile);

        assert!(first.truncated());
        assert!(first.final_size <= 200);
        assert!(payload_len(&doc) <= 200);
        assert_eq!(first.final_size, payload_len(&doc));

        let snapshot = doc.fields().clone();
        let second = resize(&mut doc, &profile);
        assert!(!second.truncated(), "second pass removed bytes: {:?}", second);
        assert_eq!(doc.fields(), &snapshot);
        assert!(payload_len(&doc) <= 200);
    }

    #[test]
    fn test_markup_reserved_when_marker_field_missing() {
        let mut doc = Document::for_page(1);
        doc.set("text", "y".repeat(400));

        let profile = SizeLimiterProfile::new(150)
            .with_field("text", 0)
            .with_markup_template("Oversize");
        let first = resize(&mut doc, &profile);

        assert_eq!(
            doc.get("template"),
            Some(&FieldValue::strings(["Oversize"]))
        );
        assert_eq!(first.final_size, payload_len(&doc));
        assert!(payload_len(&doc) <= 150);
        assert!(!resize(&mut doc, &profile).truncated());
    }

    #[test]
    fn test_no_markup_without_oversize_truncation() {
        let mut doc = Document::for_page(1);
        doc.set("text", "short");

        let profile = SizeLimiterProfile::new(1000)
            .with_field("text", 0)
            .with_markup_template("Oversize");
        resize(&mut doc, &profile);

        assert!(doc.get("template").is_none());
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut doc = Document::for_page(1);
        doc.set("text", "lorem ipsum ".repeat(40));
        doc.set("file_text", "f".repeat(80));
        doc.set("outgoing_link", FieldValue::strings(["A", "B", "C", "D"]));

        let profile = SizeLimiterProfile::new(150)
            .with_field_type("outgoing_link", FieldType::Keyword)
            .with_max_field_size("file_text", 20)
            .with_field("outgoing_link", 0)
            .with_field("text", 10);

        let first = resize(&mut doc, &profile);
        assert!(first.truncated());
        let snapshot = doc.fields().clone();

        let second = resize(&mut doc, &profile);
        assert!(!second.truncated());
        assert_eq!(doc.fields(), &snapshot);
    }

    #[test]
    fn test_stats_recorded_as_hint() {
        let mut doc = Document::for_page(1);
        doc.set("text", "q".repeat(300));

        let limiter = SizeLimiter::new(SizeLimiterProfile::new(100).with_field("text", 0));
        let stats = limiter.resize(&mut doc);

        let hinted: SizeLimiterStats = doc
            .hints()
            .get_as(SIZE_LIMITER_STATS_HINT)
            .unwrap()
            .unwrap();
        assert_eq!(hinted, stats);

        let payload: serde_json::Value =
            serde_json::from_slice(&doc.index_payload().unwrap()).unwrap();
        assert!(payload.get(SIZE_LIMITER_STATS_HINT).is_none());
    }

    #[test]
    fn test_missing_fields_are_ignored() {
        let mut doc = Document::for_page(1);
        doc.set("title", "Foo");

        let profile = SizeLimiterProfile::new(5)
            .with_max_field_size("file_text", 1)
            .with_field("text", 0);
        let stats = resize(&mut doc, &profile);

        assert!(!stats.truncated());
        assert_eq!(doc.get("title").and_then(FieldValue::as_str), Some("Foo"));
    }
}
