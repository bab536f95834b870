//! The page-fetch capability and the closed set of backends that provide it.

use std::future::Future;
use std::time::Duration;

use pagefetch_config::{BrowserSettings, FetchSettings};
use pagefetch_types::{BackendKind, FetchError};

use crate::chromium::ChromiumFetcher;
use crate::http::HttpFetcher;

/// What to load and how long to spend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    /// Upper bound on page load (navigation or HTTP exchange).
    pub timeout: Duration,
    /// Extra settle time after load so client-side rendering can finish.
    /// Ignored by backends that do not run scripts.
    pub wait: Duration,
    pub headless: bool,
}

impl PageRequest {
    /// Request with the default fetch settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_settings(url, &FetchSettings::default())
    }

    #[must_use]
    pub fn with_settings(url: impl Into<String>, settings: &FetchSettings) -> Self {
        Self {
            url: url.into(),
            timeout: settings.timeout,
            wait: settings.wait,
            headless: settings.headless,
        }
    }
}

/// A loaded page before any conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// URL after redirects. Relative links resolve against this.
    pub final_url: String,
    pub title: Option<String>,
    pub html: String,
}

/// Something that can turn a [`PageRequest`] into a [`RawPage`].
pub trait PageFetcher {
    fn kind(&self) -> BackendKind;

    fn fetch(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<RawPage, FetchError>> + Send;
}

/// The configured fetch backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Chromium(ChromiumFetcher),
    Http(HttpFetcher),
}

impl Backend {
    /// Build the backend named by `kind`.
    ///
    /// Chromium discovery is deferred to the first fetch so that a missing
    /// browser surfaces as a `BrowserUnavailable` result, not a startup failure.
    pub fn new(kind: BackendKind, settings: &BrowserSettings) -> Result<Self, FetchError> {
        match kind {
            BackendKind::Chromium => Ok(Self::Chromium(ChromiumFetcher::new(settings))),
            BackendKind::Http => HttpFetcher::new(settings).map(Self::Http),
        }
    }
}

impl PageFetcher for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Self::Chromium(fetcher) => fetcher.kind(),
            Self::Http(fetcher) => fetcher.kind(),
        }
    }

    async fn fetch(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        match self {
            Self::Chromium(fetcher) => fetcher.fetch(request).await,
            Self::Http(fetcher) => fetcher.fetch(request).await,
        }
    }
}
