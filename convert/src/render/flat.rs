//! Single-pass renderer.
//!
//! Walks the tree with an explicit stack of open/text/close steps instead of
//! recursion. Spans that need wrapping (headings, anchors, list items) write
//! into a scratch buffer that is folded into its parent when they close, so
//! the output matches [`super::StructuredRenderer`] at any depth.

use std::mem;

use scraper::{ElementRef, Node};

use pagefetch_types::RendererKind;

use super::{
    ElementRole, LinkResolver, LinkSegment, MarkdownRenderer, classify,
    collapse_inline_whitespace, collapse_whitespace, contains_block, edge_whitespace,
    ensure_blank_line, ensure_line_start, link_segments, preformatted_text, push_code,
    push_fence, push_heading, push_link, push_list_item, push_text,
};

/// Fallback renderer with no recursion depth limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRenderer;

impl MarkdownRenderer for FlatRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Flat
    }

    fn render(&self, root: ElementRef<'_>, links: &LinkResolver) -> String {
        let mut writer = FlatWriter::new(links);
        let mut stack: Vec<Step<'_>> = Vec::new();
        push_children(&mut stack, root, None);

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(element, link) => writer.open(element, link, &mut stack),
                Step::Text(text) => push_text(&mut writer.out, &collapse_inline_whitespace(text)),
                Step::Begin => writer.begin(),
                Step::Close(closer) => writer.close(closer),
            }
        }

        writer.out
    }
}

enum Step<'a> {
    /// An element, with the target of an enclosing block-wrapping anchor.
    Open(ElementRef<'a>, Option<&'a str>),
    Text(&'a str),
    /// Start a scratch buffer for a linked run.
    Begin,
    Close(Closer<'a>),
}

enum Closer<'a> {
    Block,
    Cell,
    List {
        redirected: bool,
    },
    Item {
        indent: usize,
    },
    Heading {
        level: usize,
    },
    Anchor {
        href: Option<&'a str>,
        padding: (bool, bool),
    },
    Run {
        href: &'a str,
        padding: (bool, bool),
    },
}

struct FlatWriter<'r> {
    /// Buffer currently written to.
    out: String,
    /// Suspended outer buffers, innermost last.
    saved: Vec<String>,
    links: &'r LinkResolver,
    list_depth: usize,
    /// One entry per open list or item; items collect their nested lists.
    nested: Vec<Option<String>>,
}

/// Queue `element`'s children so they pop in document order. Under a
/// block-wrapping anchor, inline runs are bracketed as links.
fn push_children<'a>(
    stack: &mut Vec<Step<'a>>,
    element: ElementRef<'a>,
    link: Option<&'a str>,
) {
    let Some(href) = link else {
        push_child_range(stack, element, 0, usize::MAX);
        return;
    };

    for segment in link_segments(element).into_iter().rev() {
        match segment {
            LinkSegment::Run {
                start,
                len,
                padding,
            } => {
                stack.push(Step::Close(Closer::Run { href, padding }));
                push_child_range(stack, element, start, len);
                stack.push(Step::Begin);
            }
            LinkSegment::Block(el) => stack.push(Step::Open(el, Some(href))),
        }
    }
}

fn push_child_range<'a>(
    stack: &mut Vec<Step<'a>>,
    element: ElementRef<'a>,
    start: usize,
    len: usize,
) {
    let steps: Vec<Step<'a>> = element
        .children()
        .skip(start)
        .take(len)
        .filter_map(|child| match child.value() {
            Node::Element(_) => ElementRef::wrap(child).map(|el| Step::Open(el, None)),
            Node::Text(text) => Some(Step::Text(text)),
            _ => None,
        })
        .collect();
    stack.extend(steps.into_iter().rev());
}

/// Lists only render their element children.
fn push_child_elements<'a>(
    stack: &mut Vec<Step<'a>>,
    element: ElementRef<'a>,
    link: Option<&'a str>,
) {
    let steps: Vec<Step<'a>> = element
        .children()
        .filter_map(ElementRef::wrap)
        .map(|el| Step::Open(el, link))
        .collect();
    stack.extend(steps.into_iter().rev());
}

impl<'r> FlatWriter<'r> {
    fn new(links: &'r LinkResolver) -> Self {
        Self {
            out: String::new(),
            saved: Vec::new(),
            links,
            list_depth: 0,
            nested: Vec::new(),
        }
    }

    fn begin(&mut self) {
        self.saved.push(mem::take(&mut self.out));
    }

    /// Close the innermost scratch buffer and return its contents.
    fn end(&mut self) -> String {
        let outer = self.saved.pop().unwrap_or_default();
        mem::replace(&mut self.out, outer)
    }

    fn open<'a>(
        &mut self,
        element: ElementRef<'a>,
        link: Option<&'a str>,
        stack: &mut Vec<Step<'a>>,
    ) {
        let closer = match classify(element.value().name()) {
            ElementRole::Skip => return,
            ElementRole::Preformatted => {
                push_fence(&mut self.out, &preformatted_text(element));
                return;
            }
            ElementRole::Code => {
                push_code(&mut self.out, element);
                return;
            }
            ElementRole::Break => {
                self.out.push('\n');
                return;
            }
            ElementRole::Inline => {
                push_children(stack, element, link);
                return;
            }
            ElementRole::Anchor if contains_block(element) => {
                push_children(stack, element, element.value().attr("href"));
                return;
            }
            ElementRole::Anchor => {
                self.begin();
                Closer::Anchor {
                    href: element.value().attr("href"),
                    padding: edge_whitespace(element),
                }
            }
            ElementRole::Heading(level) => {
                self.begin();
                Closer::Heading { level }
            }
            ElementRole::Block => {
                ensure_blank_line(&mut self.out);
                Closer::Block
            }
            ElementRole::Cell => Closer::Cell,
            ElementRole::List => {
                let redirected = matches!(self.nested.last(), Some(Some(_)));
                if redirected {
                    self.begin();
                }
                if self.list_depth == 0 {
                    ensure_blank_line(&mut self.out);
                } else {
                    ensure_line_start(&mut self.out);
                }
                self.list_depth += 1;
                self.nested.push(None);
                stack.push(Step::Close(Closer::List { redirected }));
                push_child_elements(stack, element, link);
                return;
            }
            ElementRole::Item => {
                self.begin();
                self.nested.push(Some(String::new()));
                Closer::Item {
                    indent: self.list_depth.saturating_sub(1),
                }
            }
        };

        stack.push(Step::Close(closer));
        push_children(stack, element, link);
    }

    fn close(&mut self, closer: Closer<'_>) {
        match closer {
            Closer::Block => ensure_blank_line(&mut self.out),
            Closer::Cell => self.out.push(' '),
            Closer::List { redirected } => {
                self.nested.pop();
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    ensure_blank_line(&mut self.out);
                }
                if redirected {
                    let list = self.end();
                    if let Some(Some(nested)) = self.nested.last_mut() {
                        ensure_line_start(nested);
                        nested.push_str(&list);
                    }
                }
            }
            Closer::Item { indent } => {
                let nested = self.nested.pop().flatten().unwrap_or_default();
                let text = self.end();
                push_list_item(&mut self.out, indent, &collapse_whitespace(&text));
                if !nested.is_empty() {
                    ensure_line_start(&mut self.out);
                    self.out.push_str(&nested);
                }
            }
            Closer::Heading { level } => {
                let text = self.end();
                push_heading(&mut self.out, level, &collapse_whitespace(&text));
            }
            Closer::Anchor { href, padding } => {
                let text = self.end();
                push_link(&mut self.out, &text, href, padding, self.links);
            }
            Closer::Run { href, padding } => {
                let text = self.end();
                push_link(&mut self.out, &text, Some(href), padding, self.links);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FlatRenderer;
    use crate::render::{LinkResolver, MarkdownRenderer};
    use scraper::Html;

    fn render(html: &str, base: Option<&str>) -> String {
        let fragment = Html::parse_fragment(html);
        FlatRenderer.render(fragment.root_element(), &LinkResolver::new(base))
    }

    #[test]
    fn nested_lists_indent_by_depth() {
        let out = render(
            "<ul><li>one<ul><li>inner</li></ul></li><li>two</li></ul>",
            None,
        );
        assert_eq!(out.trim(), "- one\n  - inner\n- two");
    }

    #[test]
    fn anchor_inside_heading() {
        let out = render(
            r#"<h3>Read <a href="guide">the guide</a></h3>"#,
            Some("https://example.com/docs/"),
        );
        assert_eq!(
            out.trim(),
            "### Read [the guide](https://example.com/docs/guide)"
        );
    }

    #[test]
    fn anchor_without_text_is_dropped() {
        let out = render(r#"<p>a<a href="/x"><img src="i.png"></a>b</p>"#, None);
        assert_eq!(out.trim(), "ab");
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 5_000;
        let html = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
        assert_eq!(render(&html, None).trim(), "deep");
    }

    #[test]
    fn anchor_around_blocks_links_each_run() {
        let out = render(
            r#"<a href="/card"><h3>Card</h3><p>Summary <em>text</em></p>more</a>"#,
            Some("https://example.com/"),
        );
        assert_eq!(
            out.trim(),
            "### [Card](https://example.com/card)\n\n\
             [Summary text](https://example.com/card)\n\n\
             [more](https://example.com/card)"
        );
    }

    #[test]
    fn nested_list_inside_item_wrapper_follows_item_line() {
        let out = render(
            "<ul><li><div>outer<ul><li>inner</li></ul></div></li><li>next</li></ul>",
            None,
        );
        assert_eq!(out.trim(), "- outer\n  - inner\n- next");
    }

    #[test]
    fn heading_containing_list_inside_item() {
        let out = render("<ul><li><h3>Head<ul><li>y</li></ul></h3></li></ul>", None);
        assert_eq!(out.trim(), "- ### Head\n  - y");
    }
}
