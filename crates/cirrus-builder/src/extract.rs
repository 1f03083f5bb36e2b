//! Plain-text extraction from rendered page HTML.
//!
//! One walk over the DOM splits the page into:
//! - `text`: body text, headings and auxiliary blocks excluded
//! - `opening_text`: body text before the first section heading
//! - `heading`: section headings (h1 to h6)
//! - `auxiliary_text`: captions, hatnotes, tables and other secondary blocks

use scraper::node::Node;
use scraper::{ElementRef, Html};

const IGNORE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

const IGNORE_CLASSES: &[&str] = &["mw-editsection", "noprint", "mw-empty-elt", "reference"];

const AUXILIARY_TAGS: &[&str] = &["table", "figcaption", "caption"];

const AUXILIARY_CLASSES: &[&str] = &[
    "thumbcaption",
    "hatnote",
    "rellink",
    "dablink",
    "searchaux",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "br", "blockquote", "pre", "section", "tr",
    "td", "th",
];

/// Text split out of one HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub opening_text: Option<String>,
    pub heading: Vec<String>,
    pub auxiliary_text: Vec<String>,
}

/// Split rendered HTML into body, opening, heading and auxiliary text.
pub fn extract_text(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);
    let mut collector = TextCollector::default();
    collector.walk(document.root_element());
    collector.finish()
}

/// Plain text of an HTML fragment with whitespace collapsed.
pub fn strip_markup(fragment: &str) -> String {
    let fragment = Html::parse_fragment(fragment);
    let mut buf = String::new();
    collect_text(fragment.root_element(), &mut buf);
    normalize_whitespace(&buf)
}

#[derive(Default)]
struct TextCollector {
    body: String,
    opening: String,
    seen_heading: bool,
    heading: Vec<String>,
    auxiliary: Vec<String>,
}

impl TextCollector {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    self.body.push_str(text);
                    if !self.seen_heading {
                        self.opening.push_str(text);
                    }
                }
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        if should_ignore(element) {
            return;
        }

        if heading_level(tag).is_some() {
            self.seen_heading = true;
            push_normalized(&mut self.heading, element);
            return;
        }

        if is_auxiliary(element) {
            push_normalized(&mut self.auxiliary, element);
            return;
        }

        let block = BLOCK_TAGS.contains(&tag);
        if block {
            self.break_block();
        }
        self.walk(element);
        if block {
            self.break_block();
        }
    }

    fn break_block(&mut self) {
        self.body.push(' ');
        if !self.seen_heading {
            self.opening.push(' ');
        }
    }

    fn finish(self) -> ExtractedText {
        let opening = normalize_whitespace(&self.opening);
        ExtractedText {
            text: normalize_whitespace(&self.body),
            opening_text: (!opening.is_empty()).then_some(opening),
            heading: self.heading,
            auxiliary_text: self.auxiliary,
        }
    }
}

fn push_normalized(out: &mut Vec<String>, element: ElementRef<'_>) {
    let mut buf = String::new();
    collect_text(element, &mut buf);
    let text = normalize_whitespace(&buf);
    if !text.is_empty() {
        out.push(text);
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if should_ignore(child) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&child.value().name());
                if block {
                    out.push(' ');
                }
                collect_text(child, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn should_ignore(element: ElementRef<'_>) -> bool {
    let value = element.value();
    IGNORE_TAGS.contains(&value.name())
        || value.classes().any(|class| IGNORE_CLASSES.contains(&class))
}

fn is_auxiliary(element: ElementRef<'_>) -> bool {
    let value = element.value();
    AUXILIARY_TAGS.contains(&value.name())
        || value.classes().any(|class| AUXILIARY_CLASSES.contains(&class))
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn normalize_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}
