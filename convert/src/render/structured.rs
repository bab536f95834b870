//! Recursive renderer: one call per element, block content assembled in
//! scratch buffers and spliced into the parent's output.

use std::mem;

use scraper::{ElementRef, Node};

use pagefetch_types::RendererKind;

use super::{
    ElementRole, FlatRenderer, LinkResolver, LinkSegment, MarkdownRenderer, classify,
    collapse_inline_whitespace, collapse_whitespace, contains_block, edge_whitespace,
    ensure_blank_line, ensure_line_start, link_segments, preformatted_text, push_code,
    push_fence, push_heading, push_link, push_list_item, push_text,
};

/// Element nesting beyond which rendering is handed to [`FlatRenderer`].
const MAX_NESTING: usize = 512;

/// The default renderer.
///
/// Very deeply nested trees are rendered by [`FlatRenderer`], which produces
/// the same output without recursing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredRenderer;

impl MarkdownRenderer for StructuredRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Structured
    }

    fn render(&self, root: ElementRef<'_>, links: &LinkResolver) -> String {
        if nesting_exceeds(root, MAX_NESTING) {
            tracing::debug!(
                limit = MAX_NESTING,
                "Deeply nested content, rendering without recursion"
            );
            return FlatRenderer.render(root, links);
        }

        let mut ctx = ConversionContext::new(links);
        let mut output = String::new();
        convert_children(&mut output, root, &mut ctx);
        output
    }
}

/// Whether any element sits more than `limit` levels below `root`.
fn nesting_exceeds(root: ElementRef<'_>, limit: usize) -> bool {
    let mut stack = vec![(*root, 0_usize)];
    while let Some((node, depth)) = stack.pop() {
        if depth > limit {
            return true;
        }
        for child in node.children().filter(|child| child.value().is_element()) {
            stack.push((child, depth + 1));
        }
    }
    false
}

/// Context for Markdown conversion, tracking state across recursive calls.
struct ConversionContext<'a, 'r> {
    links: &'r LinkResolver,

    /// Current list nesting depth.
    list_depth: usize,

    /// Target of an enclosing anchor that wraps block content.
    link: Option<&'a str>,

    /// One entry per open list or item, innermost last. Items collect the
    /// lists nested anywhere below them; lists shield their own children.
    nested: Vec<Option<String>>,
}

impl<'a, 'r> ConversionContext<'a, 'r> {
    fn new(links: &'r LinkResolver) -> Self {
        Self {
            links,
            list_depth: 0,
            link: None,
            nested: Vec::new(),
        }
    }

    /// Indent level for items of the innermost open list.
    fn item_indent(&self) -> usize {
        self.list_depth.saturating_sub(1)
    }
}

fn convert_children<'a>(
    output: &mut String,
    element: ElementRef<'a>,
    ctx: &mut ConversionContext<'a, '_>,
) {
    let Some(href) = ctx.link else {
        convert_child_range(output, element, 0, usize::MAX, ctx);
        return;
    };

    for segment in link_segments(element) {
        match segment {
            LinkSegment::Run {
                start,
                len,
                padding,
            } => {
                let mut text = String::new();
                ctx.link = None;
                convert_child_range(&mut text, element, start, len, ctx);
                ctx.link = Some(href);
                push_link(output, &text, Some(href), padding, ctx.links);
            }
            LinkSegment::Block(el) => convert_element(output, el, ctx),
        }
    }
}

fn convert_child_range<'a>(
    output: &mut String,
    element: ElementRef<'a>,
    start: usize,
    len: usize,
    ctx: &mut ConversionContext<'a, '_>,
) {
    for child in element.children().skip(start).take(len) {
        match child.value() {
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    convert_element(output, el, ctx);
                }
            }
            Node::Text(text) => push_text(output, &collapse_inline_whitespace(text)),
            _ => {}
        }
    }
}

fn convert_element<'a>(
    output: &mut String,
    element: ElementRef<'a>,
    ctx: &mut ConversionContext<'a, '_>,
) {
    match classify(element.value().name()) {
        ElementRole::Skip => {}
        ElementRole::Heading(level) => {
            let mut heading_text = String::new();
            convert_children(&mut heading_text, element, ctx);
            push_heading(output, level, &collapse_whitespace(&heading_text));
        }
        ElementRole::Block => {
            ensure_blank_line(output);
            convert_children(output, element, ctx);
            ensure_blank_line(output);
        }
        ElementRole::List => convert_list(output, element, ctx),
        ElementRole::Item => convert_list_item(output, element, ctx),
        ElementRole::Preformatted => push_fence(output, &preformatted_text(element)),
        ElementRole::Code => push_code(output, element),
        ElementRole::Anchor if contains_block(element) => {
            let outer = mem::replace(&mut ctx.link, element.value().attr("href"));
            convert_children(output, element, ctx);
            ctx.link = outer;
        }
        ElementRole::Anchor => {
            let mut text = String::new();
            convert_children(&mut text, element, ctx);
            push_link(
                output,
                &text,
                element.value().attr("href"),
                edge_whitespace(element),
                ctx.links,
            );
        }
        ElementRole::Break => output.push('\n'),
        ElementRole::Cell => {
            convert_children(output, element, ctx);
            output.push(' ');
        }
        ElementRole::Inline => convert_children(output, element, ctx),
    }
}

/// A list inside an item is written after that item's line, wherever in the
/// item it appears.
fn convert_list<'a>(
    output: &mut String,
    element: ElementRef<'a>,
    ctx: &mut ConversionContext<'a, '_>,
) {
    if !matches!(ctx.nested.last(), Some(Some(_))) {
        write_list(output, element, ctx);
        return;
    }

    let mut list = String::new();
    write_list(&mut list, element, ctx);
    if let Some(Some(nested)) = ctx.nested.last_mut() {
        ensure_line_start(nested);
        nested.push_str(&list);
    }
}

fn write_list<'a>(
    output: &mut String,
    element: ElementRef<'a>,
    ctx: &mut ConversionContext<'a, '_>,
) {
    if ctx.list_depth == 0 {
        ensure_blank_line(output);
    } else {
        ensure_line_start(output);
    }

    ctx.list_depth += 1;
    ctx.nested.push(None);
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            convert_element(output, el, ctx);
        }
    }
    ctx.nested.pop();
    ctx.list_depth -= 1;

    if ctx.list_depth == 0 {
        ensure_blank_line(output);
    }
}

/// The item's own text becomes one `- ` line; nested lists follow it on
/// their own lines, one level deeper.
fn convert_list_item<'a>(
    output: &mut String,
    li: ElementRef<'a>,
    ctx: &mut ConversionContext<'a, '_>,
) {
    let mut text = String::new();
    ctx.nested.push(Some(String::new()));
    convert_children(&mut text, li, ctx);
    let nested = ctx.nested.pop().flatten().unwrap_or_default();

    push_list_item(output, ctx.item_indent(), &collapse_whitespace(&text));
    if !nested.is_empty() {
        ensure_line_start(output);
        output.push_str(&nested);
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_NESTING, StructuredRenderer, nesting_exceeds};
    use crate::render::{LinkResolver, MarkdownRenderer};
    use scraper::Html;

    fn render(html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        StructuredRenderer.render(fragment.root_element(), &LinkResolver::new(None))
    }

    #[test]
    fn nested_lists_indent_by_depth() {
        let out = render("<ul><li>one<ul><li>inner</li></ul></li><li>two</li></ul>");
        assert_eq!(out.trim(), "- one\n  - inner\n- two");
    }

    #[test]
    fn ordered_items_use_dash_markers() {
        let out = render("<ol><li>first</li><li>second</li></ol>");
        assert_eq!(out.trim(), "- first\n- second");
    }

    #[test]
    fn heading_text_is_collapsed() {
        let out = render("<h2>\n  Getting\n  <em>started</em>\n</h2><p>Body</p>");
        assert_eq!(out.trim(), "## Getting started\n\nBody");
    }

    #[test]
    fn link_keeps_surrounding_spaces() {
        let out = render(r#"<p>See <a href="/x"> the docs </a>now.</p>"#);
        assert_eq!(out.trim(), "See [the docs](/x) now.");
    }

    #[test]
    fn pre_keeps_interior_whitespace() {
        let out = render("<pre><code>fn main() {\n    run();\n}\n</code></pre>");
        assert_eq!(out.trim(), "```\nfn main() {\n    run();\n}\n```");
    }

    #[test]
    fn pre_keeps_leading_blank_line() {
        let out = render("<pre>\n\nx = 1\n</pre>");
        assert_eq!(out.trim(), "```\n\nx = 1\n```");
    }

    #[test]
    fn anchor_around_blocks_links_each_run() {
        let out = render(r#"<a href="/x"><h2>Title</h2><p>para</p></a>"#);
        assert_eq!(out.trim(), "## [Title](/x)\n\n[para](/x)");
    }

    #[test]
    fn list_below_linked_item_text_starts_its_own_line() {
        let out = render(r#"<ul><li><a href="/x">text<ul><li>y</li></ul></a></li></ul>"#);
        assert_eq!(out.trim(), "- [text](/x)\n  - [y](/x)");
    }

    #[test]
    fn text_after_nested_list_stays_on_item_line() {
        let out = render("<ul><li>before <ul><li>inner</li></ul> after</li></ul>");
        assert_eq!(out.trim(), "- before after\n  - inner");
    }

    #[test]
    fn nesting_depth_is_measured_without_recursion() {
        let html = |depth: usize| format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let shallow = Html::parse_fragment(&html(MAX_NESTING - 10));
        assert!(!nesting_exceeds(shallow.root_element(), MAX_NESTING));
        let deep = Html::parse_fragment(&html(MAX_NESTING + 10));
        assert!(nesting_exceeds(deep.root_element(), MAX_NESTING));
    }

    #[test]
    fn deep_nesting_is_rendered_without_overflow() {
        let depth = 20_000;
        let out = render(&format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth)));
        assert_eq!(out.trim(), "deep");
    }
}
