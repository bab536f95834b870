//! HTML → bounded markdown.
//!
//! The pipeline is a chain of pure, synchronous stages:
//!
//! 1. [`filter`]: drop scripts, navigation, ads and similar boilerplate
//! 2. [`locate`]: pick the main-content container
//! 3. [`render`]: convert the container to markdown, resolving links
//! 4. [`normalize`]: tidy whitespace
//! 5. [`truncate`]: bound the length at a paragraph or sentence boundary
//!
//! None of the stages can fail. Malformed markup is recovered by the parser and
//! input without any markup is treated as a single block of text.

pub mod filter;
pub mod locate;
pub mod normalize;
pub mod render;
pub mod truncate;

use scraper::Html;

use pagefetch_types::RendererKind;

pub use locate::{CONTENT_RULES, ContentContainer, locate_main_content};
pub use normalize::normalize_whitespace;
pub use render::{FlatRenderer, LinkResolver, MarkdownRenderer, StructuredRenderer, renderer_for};
pub use truncate::{TRUNCATION_MARKER, Truncation, truncate, truncate_content};

/// Filter boilerplate out of a full page and return the main-content
/// container as an HTML string.
#[must_use]
pub fn extract_main_content(html: &str) -> String {
    let mut document = Html::parse_document(html);
    filter::remove_boilerplate(&mut document);
    locate_main_content(&document).html()
}

/// Render an HTML fragment to normalized markdown with the default renderer.
#[must_use]
pub fn html_to_markdown(html_fragment: &str, base_url: Option<&str>) -> String {
    html_to_markdown_with(RendererKind::default(), html_fragment, base_url)
}

#[must_use]
pub fn html_to_markdown_with(
    renderer: RendererKind,
    html_fragment: &str,
    base_url: Option<&str>,
) -> String {
    if html_fragment.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html_fragment);
    let links = LinkResolver::new(base_url);
    let raw = renderer_for(renderer).render(fragment.root_element(), &links);
    normalize_whitespace(&raw)
}

/// Full page → normalized markdown of its main content (not truncated).
#[must_use]
pub fn page_to_markdown(html: &str, base_url: Option<&str>, renderer: RendererKind) -> String {
    html_to_markdown_with(renderer, &extract_main_content(html), base_url)
}
