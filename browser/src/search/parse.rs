//! Per-engine result scrapers.
//!
//! Engines change their markup often; each scraper keys on the most stable
//! hooks known for that engine and skips entries missing a title or link.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use pagefetch_types::{SearchEngine, SearchHit};

/// Snippet containers under a Google result, most specific first.
const GOOGLE_SNIPPET_SELECTORS: [&str; 4] =
    ["div[data-sncf]", "div.VwiC3b", "span.aCOpRe", "div > span"];

/// A snippet shorter than this is probably a date or breadcrumb.
const MIN_SNIPPET_CHARS: usize = 20;

/// Scrape up to `max_results` hits from a result page. Relative links resolve
/// against `base`.
#[must_use]
pub fn scrape_results(
    engine: SearchEngine,
    html: &str,
    base: &Url,
    max_results: usize,
) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    match engine {
        SearchEngine::Google => google(&document, base, max_results),
        SearchEngine::Bing => bing(&document, base, max_results),
        SearchEngine::DuckDuckGo => duckduckgo(&document, base, max_results),
    }
}

/// Google wraps each result title in an `h3` inside its link; the surrounding
/// block is marked with `data-hveid` or the legacy `g` class.
fn google(document: &Html, base: &Url, max_results: usize) -> Vec<SearchHit> {
    let (Ok(heading), Ok(anchor)) = (Selector::parse("h3"), Selector::parse("a")) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for h3 in document.select(&heading).take(max_results.saturating_mul(2)) {
        if hits.len() >= max_results {
            break;
        }
        let title = text_of(h3);
        if title.is_empty() {
            continue;
        }

        let link = closest(h3, |el| el.value().name() == "a").or_else(|| {
            h3.parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.select(&anchor).next())
        });
        let Some(url) = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(base, href))
            .map(unwrap_google_redirect)
        else {
            continue;
        };
        if url.contains("google.com") {
            continue;
        }

        let snippet = closest(h3, |el| {
            el.value().name() == "div" && el.value().attr("data-hveid").is_some()
        })
        .or_else(|| closest(h3, |el| el.value().classes().any(|class| class == "g")))
        .map(google_snippet)
        .unwrap_or_default();

        hits.push(SearchHit {
            title,
            url,
            snippet,
        });
    }
    hits
}

fn google_snippet(container: ElementRef<'_>) -> String {
    let mut fallback = String::new();
    for css in GOOGLE_SNIPPET_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let Some(element) = container.select(&selector).next() else {
            continue;
        };
        let text = text_of(element);
        if text.chars().count() > MIN_SNIPPET_CHARS {
            return text;
        }
        if !text.is_empty() {
            fallback = text;
        }
    }
    fallback
}

/// Google result links point at `/url?q=<target>` on some layouts.
fn unwrap_google_redirect(url: Url) -> String {
    if url.path() == "/url"
        && let Some((_, target)) = url
            .query_pairs()
            .find(|(key, value)| (key == "q" || key == "url") && !value.is_empty())
    {
        return target.into_owned();
    }
    url.into()
}

fn bing(document: &Html, base: &Url, max_results: usize) -> Vec<SearchHit> {
    let (Ok(item), Ok(title_link), Ok(paragraph)) = (
        Selector::parse("li.b_algo"),
        Selector::parse("h2 a"),
        Selector::parse("p"),
    ) else {
        return Vec::new();
    };

    document
        .select(&item)
        .take(max_results)
        .filter_map(|result| {
            let link = result.select(&title_link).next()?;
            let title = text_of(link);
            let url = link
                .value()
                .attr("href")
                .and_then(|href| resolve(base, href))?;
            if title.is_empty() {
                return None;
            }
            let snippet = result
                .select(&paragraph)
                .next()
                .map(text_of)
                .unwrap_or_default();
            Some(SearchHit {
                title,
                url: url.into(),
                snippet,
            })
        })
        .collect()
}

fn duckduckgo(document: &Html, base: &Url, max_results: usize) -> Vec<SearchHit> {
    let (Ok(article), Ok(heading), Ok(anchor), Ok(snippet)) = (
        Selector::parse("article"),
        Selector::parse("h2"),
        Selector::parse("a"),
        Selector::parse(r#"div[data-result="snippet"]"#),
    ) else {
        return Vec::new();
    };

    document
        .select(&article)
        .take(max_results)
        .filter_map(|result| {
            let title = result.select(&heading).next().map(text_of)?;
            let url = result
                .select(&anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve(base, href))?;
            if title.is_empty() {
                return None;
            }
            let snippet = result
                .select(&snippet)
                .next()
                .map(text_of)
                .unwrap_or_default();
            Some(SearchHit {
                title,
                url: url.into(),
                snippet,
            })
        })
        .collect()
}

fn closest<'a>(
    element: ElementRef<'a>,
    predicate: impl Fn(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| predicate(ancestor))
}

fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
