//! Plain HTTP fetcher. No JavaScript runs, so script-rendered pages come back
//! as their server-side shell.

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use pagefetch_config::BrowserSettings;
use pagefetch_types::{BackendKind, ErrorCode, FetchError};

use crate::backend::{PageFetcher, PageRequest, RawPage};

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &BrowserSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| {
                FetchError::new(
                    ErrorCode::Internal,
                    format!("failed to build HTTP client: {e}"),
                    false,
                )
            })?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn kind(&self) -> BackendKind {
        BackendKind::Http
    }

    async fn fetch(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        let response = self
            .client
            .get(request.url.as_str())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| request_error(&e, request))?;

        let status = response.status();
        check_status(status)?;

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| request_error(&e, request))?;
        let title = document_title(&html);

        Ok(RawPage {
            final_url,
            title,
            html,
        })
    }
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    let message = format!("HTTP {status}");
    let code = if status.is_client_error() {
        ErrorCode::Http4xx
    } else if status.is_server_error() {
        ErrorCode::Http5xx
    } else {
        ErrorCode::Network
    };
    Err(FetchError::from_code(code, message))
}

fn request_error(err: &reqwest::Error, request: &PageRequest) -> FetchError {
    if err.is_timeout() {
        return FetchError::from_code(
            ErrorCode::Timeout,
            format!(
                "request exceeded {:.1}s",
                request.timeout.as_secs_f64()
            ),
        );
    }
    if err.is_builder() {
        return FetchError::from_code(ErrorCode::InvalidUrl, format!("invalid request: {err}"));
    }
    if err.is_redirect() {
        return FetchError::new(
            ErrorCode::Network,
            format!("too many redirects (limit {MAX_REDIRECTS})"),
            false,
        );
    }
    FetchError::from_code(ErrorCode::Network, format!("request failed: {err}"))
}

/// Text of the first `<title>`, whitespace-collapsed.
fn document_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = document.select(&selector).next()?;
    let text = title.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
