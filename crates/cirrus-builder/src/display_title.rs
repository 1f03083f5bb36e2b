//! Display title normalization.
//!
//! A page may override how its title is displayed. Only overrides that
//! differ from the real title are worth indexing.

use cirrus_types::PageRef;

use crate::extract::strip_markup;
use crate::source::NamespaceResolver;

/// Normalize a page's display title.
///
/// Returns `None` when the display title is empty or equivalent to the
/// page title, with or without its namespace prefix. A `prefix:` naming the
/// page's own namespace is stripped; any other prefix is kept as is.
pub fn normalize_display_title(
    display_title: &str,
    page: &PageRef,
    namespaces: &dyn NamespaceResolver,
) -> Option<String> {
    let cleaned = strip_markup(display_title);
    if cleaned.is_empty() {
        return None;
    }

    let prefixed = namespaces.prefixed_title(page.namespace, &page.title);
    if same_title(&cleaned, &page.title) || same_title(&cleaned, &prefixed) {
        return None;
    }

    let Some((prefix, rest)) = cleaned.split_once(':') else {
        return Some(cleaned);
    };
    match namespaces.resolve_prefix(prefix.trim()) {
        Some(namespace) if namespace == page.namespace => {
            let rest = rest.trim();
            if rest.is_empty() || same_title(rest, &page.title) {
                None
            } else {
                Some(rest.to_string())
            }
        }
        _ => Some(cleaned),
    }
}

/// Case and underscore insensitive title comparison.
fn same_title(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

fn fold(title: &str) -> String {
    title.replace('_', " ").trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InMemoryNamespaces;
    use chrono::Utc;

    fn page(namespace: i32, title: &str) -> PageRef {
        PageRef::new(1, namespace, title, 1, Utc::now())
    }

    #[test]
    fn test_equivalent_titles_dropped() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(normalize_display_title("Foo bar", &page(0, "Foo bar"), &ns), None);
        assert_eq!(normalize_display_title("<i>foo_Bar</i>", &page(0, "Foo bar"), &ns), None);
        assert_eq!(normalize_display_title("Talk:Foo", &page(1, "Foo"), &ns), None);
        assert_eq!(normalize_display_title("  ", &page(0, "Foo"), &ns), None);
    }

    #[test]
    fn test_markup_stripped() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(
            normalize_display_title("<i>iPhone</i> <span>12</span>", &page(0, "IPhone 13"), &ns),
            Some("iPhone 12".to_string())
        );
    }

    #[test]
    fn test_own_namespace_prefix_stripped() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(
            normalize_display_title("Help:<b>Editing</b> pages", &page(12, "Editing"), &ns),
            Some("Editing pages".to_string())
        );
        // Alias of the page's own namespace
        assert_eq!(
            normalize_display_title("WP:foo", &page(4, "Foo"), &ns),
            None
        );
    }

    #[test]
    fn test_other_namespace_prefix_kept() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(
            normalize_display_title("Talk:Other", &page(0, "Foo"), &ns),
            Some("Talk:Other".to_string())
        );
    }

    #[test]
    fn test_unresolvable_prefix_unchanged() {
        let ns = InMemoryNamespaces::default();
        assert_eq!(
            normalize_display_title("Star Wars: Episode IV", &page(0, "Star Wars"), &ns),
            Some("Star Wars: Episode IV".to_string())
        );
    }
}
