//! Boilerplate removal.
//!
//! Two passes over the parsed document, tag names first, then `id`/`class`
//! patterns. Matching elements are detached together with their subtrees.

use std::sync::OnceLock;

use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html};

/// Tags removed outright, whatever their attributes.
pub const REMOVED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe", "form",
    "button", "input",
];

/// Substrings that mark an `id` or `class` as non-content. Matched
/// case-insensitively anywhere in the attribute value, so `sidebar-menu` and
/// `navigation` both hit.
pub const REMOVED_PATTERNS: &[&str] = &[
    "nav",
    "menu",
    "sidebar",
    "footer",
    "header",
    "cookie",
    "banner",
    "advertisement",
    "social",
    "comment",
    "related",
];

static BOILERPLATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn boilerplate_pattern() -> &'static Regex {
    BOILERPLATE_PATTERN.get_or_init(|| {
        Regex::new(&format!("(?i){}", REMOVED_PATTERNS.join("|")))
            .expect("valid boilerplate pattern regex")
    })
}

/// Remove navigation, scripts, ads and similar elements in place.
///
/// Returns the number of subtrees detached.
pub fn remove_boilerplate(document: &mut Html) -> usize {
    let by_tag = detach_matching(document, |el| REMOVED_TAGS.contains(&el.name()));
    let by_attr = detach_matching(document, has_boilerplate_attr);
    tracing::trace!(by_tag, by_attr, "Removed boilerplate elements");
    by_tag + by_attr
}

fn has_boilerplate_attr(element: &Element) -> bool {
    let pattern = boilerplate_pattern();
    element.id().is_some_and(|id| pattern.is_match(id))
        || element.attr("class").is_some_and(|class| pattern.is_match(class))
}

fn detach_matching(document: &mut Html, matches: impl Fn(&Element) -> bool) -> usize {
    let doomed: Vec<_> = attached_elements(document)
        .filter(|el| matches(el.value()))
        .map(|el| el.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}

/// Elements still reachable from the document root, in document order.
///
/// `Html::select` walks every node the tree has ever held, detached ones
/// included, so lookups after removal go through this instead.
pub(crate) fn attached_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.tree.root().descendants().filter_map(ElementRef::wrap)
}
