//! Web search by scraping a search engine's result page.

mod parse;

use std::time::{Duration, Instant};

use pagefetch_config::{FetchSettings, SearchSettings};
use pagefetch_types::{ErrorCode, FetchError, SearchEngine, SearchResponse};
use url::Url;

use crate::backend::{PageFetcher, PageRequest};
use crate::page::elapsed_ms;

pub use parse::scrape_results;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub engine: SearchEngine,
    pub query: String,
    pub max_results: usize,
    pub timeout: Duration,
    pub wait: Duration,
    pub headless: bool,
    /// Replaces the engine's public endpoint; the query is still appended as `q`.
    endpoint: Option<String>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, search: &SearchSettings, fetch: &FetchSettings) -> Self {
        Self {
            engine: search.engine,
            query: query.into(),
            max_results: search.max_results,
            timeout: fetch.timeout,
            wait: fetch.wait,
            headless: fetch.headless,
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Result-page URL with the query form-encoded as `q`.
    pub fn url(&self) -> Result<Url, FetchError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .unwrap_or_else(|| self.engine.endpoint());
        let mut url = Url::parse(endpoint).map_err(|e| {
            FetchError::from_code(
                ErrorCode::InvalidUrl,
                format!("search endpoint '{endpoint}': {e}"),
            )
        })?;
        url.query_pairs_mut().append_pair("q", &self.query);
        Ok(url)
    }
}

/// Run `request` through `fetcher` and scrape the result page.
///
/// Never fails: errors, and a page with zero recognizable results, become a
/// `SearchResponse` with `success = false`.
pub async fn search<F: PageFetcher>(fetcher: &F, request: &SearchRequest) -> SearchResponse {
    let started = Instant::now();
    let backend = fetcher.kind();
    let failed = |err: &FetchError| {
        tracing::warn!(engine = %request.engine, code = ?err.code, "Search failed: {err}");
        SearchResponse::failed(&request.query, request.engine, err, elapsed_ms(started))
    };

    let url = match request.url() {
        Ok(url) => url,
        Err(err) => return failed(&err),
    };
    tracing::info!(engine = %request.engine, %backend, %url, "Searching");

    let page_request = PageRequest {
        url: url.to_string(),
        timeout: request.timeout,
        wait: request.wait,
        headless: request.headless,
    };
    let raw = match fetcher.fetch(&page_request).await {
        Ok(raw) => raw,
        Err(err) => return failed(&err),
    };

    let base = Url::parse(&raw.final_url).unwrap_or(url);
    let hits = scrape_results(request.engine, &raw.html, &base, request.max_results);
    tracing::debug!(count = hits.len(), "Scraped search results");

    SearchResponse::from_hits(
        &request.query,
        request.engine,
        hits,
        elapsed_ms(started),
        backend,
    )
}
