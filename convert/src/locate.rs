//! Main-content container selection.

use std::iter;

use scraper::{ElementRef, Html, Selector};

use crate::filter::attached_elements;

/// Ordered candidate rules, `(name, css selector)`. The first rule with any
/// match wins and only its first match in document order is used.
pub const CONTENT_RULES: &[(&str, &str)] = &[
    ("main", "main"),
    ("article", "article"),
    ("role=main", "[role=\"main\"]"),
    ("#content", "#content"),
    ("#main", "#main"),
    ("#main-content", "#main-content"),
    (".content", ".content"),
    (".post", ".post"),
    (".article", ".article"),
];

/// The subtree chosen as a page's main content.
#[derive(Debug, Clone, Copy)]
pub enum ContentContainer<'a> {
    /// Matched by `rule`, either one of [`CONTENT_RULES`] or `"body"`.
    Element {
        rule: &'static str,
        element: ElementRef<'a>,
    },
    /// Nothing matched and there is no `<body>`.
    Document(&'a Html),
}

impl ContentContainer<'_> {
    /// Serialized HTML of the container, outer tags included.
    #[must_use]
    pub fn html(&self) -> String {
        match self {
            ContentContainer::Element { element, .. } => element.html(),
            // Root children only; `<html>` itself may have been filtered out.
            ContentContainer::Document(document) => document
                .tree
                .root()
                .children()
                .filter_map(ElementRef::wrap)
                .map(|el| el.html())
                .collect(),
        }
    }

    #[must_use]
    pub fn rule(&self) -> &'static str {
        match self {
            ContentContainer::Element { rule, .. } => rule,
            ContentContainer::Document(_) => "document",
        }
    }
}

/// Pick the main-content container of a (filtered) document. Never fails.
pub fn locate_main_content(document: &Html) -> ContentContainer<'_> {
    let rules = CONTENT_RULES.iter().chain(iter::once(&("body", "body")));

    for &(rule, css) in rules {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = attached_elements(document).find(|el| selector.matches(el)) {
            tracing::debug!(rule, "Located main content");
            return ContentContainer::Element { rule, element };
        }
    }

    tracing::debug!("No content container, using whole document");
    ContentContainer::Document(document)
}

#[cfg(test)]
mod tests {
    use super::{ContentContainer, locate_main_content};
    use crate::filter::remove_boilerplate;
    use scraper::Html;

    fn rule_for(html: &str) -> &'static str {
        let doc = Html::parse_document(html);
        locate_main_content(&doc).rule()
    }

    #[test]
    fn earlier_rules_win_regardless_of_position() {
        let html = r#"<body>
            <div id="content">by id</div>
            <article>article</article>
            <main>main</main>
        </body>"#;
        assert_eq!(rule_for(html), "main");
    }

    #[test]
    fn first_match_in_document_order() {
        let doc =
            Html::parse_document("<body><article>one</article><article>two</article></body>");
        let container = locate_main_content(&doc);
        assert_eq!(container.html(), "<article>one</article>");
    }

    #[test]
    fn falls_through_the_table_in_order() {
        assert_eq!(rule_for(r#"<div role="main">x</div>"#), "role=main");
        assert_eq!(rule_for(r#"<div id="main-content">x</div>"#), "#main-content");
        assert_eq!(rule_for(r#"<div class="post featured">x</div>"#), ".post");
        assert_eq!(
            rule_for(r#"<div class="article">x</div><div class="content">y</div>"#),
            ".content"
        );
        assert_eq!(rule_for("<p>plain</p>"), "body");
    }

    #[test]
    fn class_rules_match_whole_tokens() {
        // `.post` must not match `postscript`.
        assert_eq!(rule_for(r#"<div class="postscript">x</div>"#), "body");
    }

    #[test]
    fn removed_candidates_are_skipped() {
        // The <main> carries a boilerplate class and is filtered away first.
        let mut doc = Html::parse_document(
            r#"<body><main class="site-header">chrome</main><article>story</article></body>"#,
        );
        remove_boilerplate(&mut doc);
        let container = locate_main_content(&doc);
        assert_eq!(container.rule(), "article");
        assert!(container.html().contains("story"));
    }

    #[test]
    fn missing_body_falls_back_to_document() {
        let mut doc = Html::parse_document(r#"<body class="has-navbar"><p>text</p></body>"#);
        remove_boilerplate(&mut doc);
        let container = locate_main_content(&doc);
        assert!(matches!(container, ContentContainer::Document(_)));
        assert!(!container.html().contains("text"));
    }
}
