//! Fetch a page and reduce it to bounded Markdown.

use std::time::Instant;

use pagefetch_convert::{page_to_markdown, truncate_content};
use pagefetch_types::{ErrorCode, FetchError, FetchMetadata, FetchResult, RendererKind};
use url::Url;

use crate::backend::{PageFetcher, PageRequest};

/// Load `request.url` with `fetcher`, extract its main content as Markdown and
/// cap it at `max_length` characters.
///
/// Never fails: errors become a `FetchResult` with `success = false`.
pub async fn fetch_page<F: PageFetcher>(
    fetcher: &F,
    request: &PageRequest,
    max_length: usize,
    renderer: RendererKind,
) -> FetchResult {
    let started = Instant::now();
    let backend = fetcher.kind();
    tracing::info!(%backend, url = %request.url, "Fetching page");

    let loaded = match validate_url(&request.url) {
        Ok(()) => fetcher.fetch(request).await,
        Err(err) => Err(err),
    };

    let raw = match loaded {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(code = ?err.code, url = %request.url, "Fetch failed: {err}");
            return FetchResult::failed(&request.url, &err, elapsed_ms(started));
        }
    };

    let markdown = page_to_markdown(&raw.html, Some(&raw.final_url), renderer);
    let content = truncate_content(&markdown, max_length);
    let metadata = FetchMetadata {
        fetch_time_ms: elapsed_ms(started),
        content_length: Some(content.chars().count()),
        html_length: Some(raw.html.chars().count()),
        backend: Some(backend),
    };
    tracing::debug!(
        final_url = %raw.final_url,
        html_length = metadata.html_length,
        content_length = metadata.content_length,
        "Converted page"
    );

    FetchResult::succeeded(&request.url, raw.final_url, raw.title, content, metadata)
}

/// Only absolute http(s) URLs are fetched.
pub(crate) fn validate_url(raw: &str) -> Result<(), FetchError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| FetchError::from_code(ErrorCode::InvalidUrl, format!("'{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FetchError::from_code(
            ErrorCode::InvalidUrl,
            format!("scheme '{scheme}' not allowed; only http and https are supported"),
        )),
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pagefetch_convert::TRUNCATION_MARKER;
    use pagefetch_types::BackendKind;

    use super::*;
    use crate::backend::RawPage;

    struct StubFetcher {
        page: Result<RawPage, FetchError>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn serving(html: &str) -> Self {
            Self {
                page: Ok(RawPage {
                    final_url: "https://example.com/docs/guide".to_string(),
                    title: Some("Guide".to_string()),
                    html: html.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: FetchError) -> Self {
            Self {
                page: Err(err),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for StubFetcher {
        fn kind(&self) -> BackendKind {
            BackendKind::Http
        }

        async fn fetch(&self, _request: &PageRequest) -> Result<RawPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone()
        }
    }

    #[tokio::test]
    async fn converts_main_content_against_final_url() {
        let fetcher = StubFetcher::serving(
            r#"<html><body><nav>Menu</nav><main><h1>Guide</h1>
            <p>See <a href="../api">the API</a>.</p></main></body></html>"#,
        );
        let request = PageRequest::new("https://example.com/start");
        let result = fetch_page(&fetcher, &request, 50_000, RendererKind::Structured).await;

        assert!(result.success);
        assert_eq!(result.final_url.as_deref(), Some("https://example.com/docs/guide"));
        assert_eq!(result.title.as_deref(), Some("Guide"));
        let content = result.content.expect("content");
        assert!(content.starts_with("# Guide"));
        assert!(content.contains("[the API](https://example.com/api)"));
        assert!(!content.contains("Menu"));
        assert_eq!(result.metadata.content_length, Some(content.chars().count()));
        assert_eq!(result.metadata.backend, Some(BackendKind::Http));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn content_is_bounded() {
        let body = "<p>word word word word word word word word.</p>".repeat(200);
        let fetcher = StubFetcher::serving(&format!("<main>{body}</main>"));
        let request = PageRequest::new("https://example.com/");
        let result = fetch_page(&fetcher, &request, 300, RendererKind::Structured).await;

        let content = result.content.expect("content");
        assert!(content.ends_with(TRUNCATION_MARKER));
        assert!(content.chars().count() <= 300 + TRUNCATION_MARKER.chars().count());
    }

    #[tokio::test]
    async fn backend_error_becomes_failed_result() {
        let fetcher =
            StubFetcher::failing(FetchError::from_code(ErrorCode::Http4xx, "HTTP 404 Not Found"));
        let request = PageRequest::new("https://example.com/missing");
        let result = fetch_page(&fetcher, &request, 50_000, RendererKind::Structured).await;

        assert!(!result.success);
        assert_eq!(result.url, "https://example.com/missing");
        assert_eq!(result.error.as_deref(), Some("Http4xx: HTTP 404 Not Found"));
        assert!(result.content.is_none());
        assert!(result.metadata.backend.is_none());
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_backend() {
        let fetcher = StubFetcher::serving("<p>unused</p>");
        for url in ["not a url", "ftp://example.com/file", "javascript:alert(1)"] {
            let request = PageRequest::new(url);
            let result = fetch_page(&fetcher, &request, 50_000, RendererKind::Flat).await;
            assert!(!result.success, "{url}");
            assert!(
                result
                    .error
                    .as_deref()
                    .is_some_and(|e| e.starts_with("InvalidUrl: ")),
                "{url}"
            );
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/a?b=c").is_ok());
        assert!(validate_url("file:///etc/passwd").is_err());
    }
}
