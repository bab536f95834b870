//! Markdown rendering of a content container.
//!
//! Both renderers share the element classification and the output helpers in
//! this module, so they agree on the markdown produced for each element kind
//! and differ only in how they walk the tree.
//!
//! | Element | Output |
//! |---------|--------|
//! | `h1` to `h6` | ATX heading with a blank line before and after |
//! | `p` and other blocks | Text block separated by a blank line |
//! | `a` | `[text](resolved href)`; plain text without a usable href; nothing without text |
//! | `a` around blocks | The blocks as usual, each inline run inside them linked |
//! | `li` | `- text`, indented two spaces per nesting level |
//! | `pre`, multi-line `code` | Fenced code block, content verbatim |
//! | inline `code` | Backtick span |
//! | `br` | Line break |
//! | `img`, `script`, embedded media | Nothing |
//! | anything else | Its text content |

mod flat;
mod structured;

use scraper::{ElementRef, Node};
use url::Url;

use pagefetch_types::RendererKind;

pub use flat::FlatRenderer;
pub use structured::StructuredRenderer;

/// Converts a parsed fragment into raw (not yet normalized) markdown.
pub trait MarkdownRenderer: Send + Sync {
    fn kind(&self) -> RendererKind;

    /// Render the children of `root`. `root` itself is only a container.
    fn render(&self, root: ElementRef<'_>, links: &LinkResolver) -> String;
}

static STRUCTURED: StructuredRenderer = StructuredRenderer;
static FLAT: FlatRenderer = FlatRenderer;

#[must_use]
pub fn renderer_for(kind: RendererKind) -> &'static dyn MarkdownRenderer {
    match kind {
        RendererKind::Structured => &STRUCTURED,
        RendererKind::Flat => &FLAT,
    }
}

/// Resolves `href` values against an optional base URL.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    base: Option<Url>,
}

impl LinkResolver {
    /// An unparseable base behaves like no base at all.
    #[must_use]
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base: base_url.and_then(|base| Url::parse(base.trim()).ok()),
        }
    }

    /// Link target for `href`, or `None` when the anchor should render as
    /// plain text (blank or script-bearing targets).
    ///
    /// Absolute URLs are returned exactly as written.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        if let Ok(absolute) = Url::parse(href) {
            return (!is_inert_scheme(absolute.scheme())).then(|| href.to_string());
        }

        match &self.base {
            Some(base) => Some(
                base.join(href)
                    .map_or_else(|_| href.to_string(), String::from),
            ),
            None => Some(href.to_string()),
        }
    }
}

fn is_inert_scheme(scheme: &str) -> bool {
    matches!(scheme, "javascript" | "vbscript" | "data")
}

/// How an element contributes to the markdown output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementRole {
    /// Dropped with its subtree.
    Skip,
    Heading(usize),
    /// Separated from its surroundings by blank lines.
    Block,
    List,
    Item,
    Preformatted,
    Code,
    Anchor,
    Break,
    /// Table cell; a trailing space keeps adjacent cells apart.
    Cell,
    /// Contributes its children only.
    Inline,
}

pub(crate) fn classify(tag: &str) -> ElementRole {
    match tag {
        "h1" => ElementRole::Heading(1),
        "h2" => ElementRole::Heading(2),
        "h3" => ElementRole::Heading(3),
        "h4" => ElementRole::Heading(4),
        "h5" => ElementRole::Heading(5),
        "h6" => ElementRole::Heading(6),

        "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "aside"
        | "blockquote" | "figure" | "figcaption" | "address" | "details" | "summary"
        | "table" | "thead" | "tbody" | "tfoot" | "tr" | "caption" | "dl" | "dt" | "dd"
        | "hr" | "body" | "html" | "center" | "fieldset" => ElementRole::Block,

        "ul" | "ol" | "menu" => ElementRole::List,
        "li" => ElementRole::Item,
        "pre" | "listing" | "xmp" => ElementRole::Preformatted,
        "code" => ElementRole::Code,
        "a" => ElementRole::Anchor,
        "br" => ElementRole::Break,
        "td" | "th" => ElementRole::Cell,

        "script" | "style" | "noscript" | "template" | "head" | "title" | "meta" | "link"
        | "img" | "picture" | "source" | "track" | "svg" | "canvas" | "iframe" | "object"
        | "embed" | "video" | "audio" | "map" | "area" | "input" | "button" | "select"
        | "textarea" => ElementRole::Skip,

        _ => ElementRole::Inline,
    }
}

/// Roles that start a line of their own.
fn is_structural(role: ElementRole) -> bool {
    matches!(
        role,
        ElementRole::Heading(_)
            | ElementRole::Block
            | ElementRole::List
            | ElementRole::Item
            | ElementRole::Preformatted
    )
}

/// Whether anything below `element` starts a line of its own.
pub(crate) fn contains_block(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| is_structural(classify(el.value().name())))
}

fn is_block_bearing(element: ElementRef<'_>) -> bool {
    match classify(element.value().name()) {
        ElementRole::Skip => false,
        role if is_structural(role) => true,
        _ => contains_block(element),
    }
}

/// A piece of the content of an anchor that wraps block elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkSegment<'a> {
    /// `len` consecutive inline children starting at child index `start`,
    /// linked as one unit.
    Run {
        start: usize,
        len: usize,
        padding: (bool, bool),
    },
    /// A child that carries the link down into its own content.
    Block(ElementRef<'a>),
}

/// Split `element`'s children into inline runs and block-bearing children.
pub(crate) fn link_segments(element: ElementRef<'_>) -> Vec<LinkSegment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut run_text = String::new();

    for (index, child) in element.children().enumerate() {
        if let Some(el) = ElementRef::wrap(child)
            && is_block_bearing(el)
        {
            push_run(&mut segments, start, index, &run_text);
            run_text.clear();
            segments.push(LinkSegment::Block(el));
            start = index + 1;
            continue;
        }
        match child.value() {
            Node::Text(text) => run_text.push_str(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    run_text.extend(el.text());
                }
            }
            _ => {}
        }
    }
    push_run(&mut segments, start, element.children().count(), &run_text);

    segments
}

fn push_run(segments: &mut Vec<LinkSegment<'_>>, start: usize, end: usize, text: &str) {
    if end > start {
        segments.push(LinkSegment::Run {
            start,
            len: end - start,
            padding: (
                text.starts_with(char::is_whitespace),
                text.ends_with(char::is_whitespace),
            ),
        });
    }
}

/// Ensure output ends with a blank line (for block elements).
pub(crate) fn ensure_blank_line(output: &mut String) {
    if output.is_empty() {
        return;
    }

    let trailing_newlines = output.chars().rev().take_while(|&c| c == '\n').count();
    match trailing_newlines {
        0 => output.push_str("\n\n"),
        1 => output.push('\n'),
        _ => {}
    }
}

pub(crate) fn ensure_line_start(output: &mut String) {
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
}

/// Append inline text, dropping whitespace at the start of a line and
/// whitespace that would double up with a space already written.
pub(crate) fn push_text(output: &mut String, text: &str) {
    let text = if output.is_empty() || output.ends_with('\n') {
        text.trim_start()
    } else if output.ends_with(' ') {
        text.trim_start_matches(' ')
    } else {
        text
    };
    output.push_str(text);
}

/// Collapse whitespace to single spaces (for block-level text).
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace runs to one space, keeping a single leading/trailing
/// space where the source had any.
pub(crate) fn collapse_inline_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut pending_space = false;

    for ch in s.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            result.push(' ');
            pending_space = false;
        }
        result.push(ch);
    }
    if pending_space {
        result.push(' ');
    }

    result
}

pub(crate) fn push_heading(output: &mut String, level: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    ensure_blank_line(output);
    output.push_str(&"#".repeat(level));
    output.push(' ');
    output.push_str(text);
    output.push_str("\n\n");
}

pub(crate) fn push_list_item(output: &mut String, indent: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    ensure_line_start(output);
    output.push_str(&"  ".repeat(indent));
    output.push_str("- ");
    output.push_str(text);
    output.push('\n');
}

/// Whether the element's raw text starts / ends with whitespace. Link text is
/// collapsed before it is wrapped, so the padding is restored from this.
pub(crate) fn edge_whitespace(element: ElementRef<'_>) -> (bool, bool) {
    let text: String = element.text().collect();
    (
        text.starts_with(char::is_whitespace),
        text.ends_with(char::is_whitespace),
    )
}

/// Emit an anchor given its already-rendered inner text.
pub(crate) fn push_link(
    output: &mut String,
    inner: &str,
    href: Option<&str>,
    padding: (bool, bool),
    links: &LinkResolver,
) {
    let text = collapse_whitespace(inner);
    if text.is_empty() {
        return;
    }

    if padding.0 {
        push_text(output, " ");
    }
    match href.and_then(|href| links.resolve(href)) {
        Some(target) => push_text(output, &format!("[{text}]({target})")),
        None => push_text(output, &text),
    }
    if padding.1 {
        output.push(' ');
    }
}

/// Verbatim text of a code block without its final newline.
///
/// The parser already drops the newline that directly follows `<pre>`, so
/// only `code` outside `pre` has a leading newline removed here.
pub(crate) fn preformatted_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    let text = match classify(element.value().name()) {
        ElementRole::Preformatted => text.as_str(),
        _ => text.strip_prefix('\n').unwrap_or(&text),
    };
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.to_string()
}

pub(crate) fn push_fence(output: &mut String, code: &str) {
    if code.trim().is_empty() {
        return;
    }
    ensure_blank_line(output);
    output.push_str("```\n");
    output.push_str(code);
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str("```\n\n");
}

/// `code` outside `pre`: a backtick span, or a fence if it spans lines.
pub(crate) fn push_code(output: &mut String, element: ElementRef<'_>) {
    let code: String = element.text().collect();
    if code.contains('\n') {
        push_fence(output, &preformatted_text(element));
        return;
    }

    let code = code.trim();
    if !code.is_empty() {
        push_text(output, &format!("`{code}`"));
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LinkResolver, LinkSegment, collapse_inline_whitespace, contains_block, ensure_blank_line,
        link_segments, preformatted_text, push_text, renderer_for,
    };
    use pagefetch_types::RendererKind;
    use scraper::{ElementRef, Html, Selector};

    fn first<'a>(fragment: &'a Html, selector: &str) -> ElementRef<'a> {
        let selector = Selector::parse(selector).expect("selector");
        fragment.select(&selector).next().expect("element")
    }

    #[test]
    fn resolves_relative_forms_against_base() {
        let links = LinkResolver::new(Some("https://example.com/docs/guide.html"));
        assert_eq!(
            links.resolve("/page").as_deref(),
            Some("https://example.com/page")
        );
        assert_eq!(
            links.resolve("intro.html").as_deref(),
            Some("https://example.com/docs/intro.html")
        );
        assert_eq!(
            links.resolve("//cdn.example.net/a.js").as_deref(),
            Some("https://cdn.example.net/a.js")
        );
        assert_eq!(
            links.resolve("#setup").as_deref(),
            Some("https://example.com/docs/guide.html#setup")
        );
    }

    #[test]
    fn absolute_urls_pass_through_verbatim() {
        let links = LinkResolver::new(Some("https://example.com/"));
        assert_eq!(
            links.resolve("HTTPS://Other.example/Path?q=1").as_deref(),
            Some("HTTPS://Other.example/Path?q=1")
        );
        assert_eq!(
            links.resolve("mailto:me@example.com").as_deref(),
            Some("mailto:me@example.com")
        );
    }

    #[test]
    fn script_and_blank_targets_are_not_links() {
        let links = LinkResolver::new(Some("https://example.com/"));
        assert_eq!(links.resolve("JaVaScRiPt:alert(1)"), None);
        assert_eq!(links.resolve("data:text/html,hi"), None);
        assert_eq!(links.resolve("   "), None);
    }

    #[test]
    fn without_base_relative_hrefs_are_kept() {
        let links = LinkResolver::new(None);
        assert_eq!(links.resolve(" /page ").as_deref(), Some("/page"));
        let bogus = LinkResolver::new(Some("not a url"));
        assert_eq!(bogus.resolve("/page").as_deref(), Some("/page"));
    }

    #[test]
    fn inline_whitespace_keeps_single_edges() {
        assert_eq!(collapse_inline_whitespace("  a \n\t b  "), " a b ");
        assert_eq!(collapse_inline_whitespace("\n\n"), " ");
        assert_eq!(collapse_inline_whitespace("word"), "word");
    }

    #[test]
    fn push_text_trims_at_line_start_and_dedups_spaces() {
        let mut out = String::new();
        push_text(&mut out, " Hello ");
        push_text(&mut out, " world");
        assert_eq!(out, "Hello world");

        ensure_blank_line(&mut out);
        push_text(&mut out, "   next");
        assert_eq!(out, "Hello world\n\nnext");
    }

    #[test]
    fn registry_returns_requested_kind() {
        for kind in [RendererKind::Structured, RendererKind::Flat] {
            assert_eq!(renderer_for(kind).kind(), kind);
        }
    }

    #[test]
    fn anchor_segments_split_at_block_children() {
        let fragment = Html::parse_fragment(
            r#"<a href="/x"> lead <em>in</em><h2>Title</h2><span><p>wrapped</p></span>tail </a>"#,
        );
        let anchor = first(&fragment, "a");
        assert!(contains_block(anchor));

        let segments = link_segments(anchor);
        assert_eq!(segments.len(), 4);
        assert_eq!(
            segments[0],
            LinkSegment::Run {
                start: 0,
                len: 2,
                padding: (true, false),
            }
        );
        assert!(matches!(segments[1], LinkSegment::Block(el) if el.value().name() == "h2"));
        assert!(matches!(segments[2], LinkSegment::Block(el) if el.value().name() == "span"));
        assert_eq!(
            segments[3],
            LinkSegment::Run {
                start: 4,
                len: 1,
                padding: (false, true),
            }
        );
    }

    #[test]
    fn inline_anchor_has_no_block_content() {
        let fragment =
            Html::parse_fragment(r#"<a href="/x">plain <em>text</em><img src="i.png"></a>"#);
        assert!(!contains_block(first(&fragment, "a")));
    }

    #[test]
    fn preformatted_text_keeps_leading_newlines_of_pre() {
        let fragment = Html::parse_fragment("<pre>\n\nindented\n</pre><code>\nlet x;\n</code>");
        assert_eq!(preformatted_text(first(&fragment, "pre")), "\nindented");
        assert_eq!(preformatted_text(first(&fragment, "code")), "let x;");
    }
}
