//! JSON result documents printed by the CLI.
//!
//! Top-level keys are always present (absent values serialize as `null`);
//! metadata keys that only exist on the success path are omitted on failure.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::kinds::{BackendKind, SearchEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub success: bool,
    /// URL as requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: Option<String>,
    pub title: Option<String>,
    /// Bounded markdown.
    pub content: Option<String>,
    pub metadata: FetchMetadata,
    /// `"<Category>: <message>"` on failure.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub fetch_time_ms: u64,
    /// Length of `content` in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    /// Length of the raw page HTML in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
}

impl FetchResult {
    #[must_use]
    pub fn succeeded(
        url: impl Into<String>,
        final_url: String,
        title: Option<String>,
        content: String,
        metadata: FetchMetadata,
    ) -> Self {
        Self {
            success: true,
            url: url.into(),
            final_url: Some(final_url),
            title,
            content: Some(content),
            metadata,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(url: impl Into<String>, error: &FetchError, fetch_time_ms: u64) -> Self {
        Self {
            success: false,
            url: url.into(),
            final_url: None,
            title: None,
            content: None,
            metadata: FetchMetadata {
                fetch_time_ms,
                ..FetchMetadata::default()
            },
            error: Some(error.summary()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub search_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub engine: SearchEngine,
    pub results: Vec<SearchHit>,
    pub metadata: SearchMetadata,
    pub error: Option<String>,
}

/// Error text for a search page that scraped to zero results.
pub const NO_RESULTS: &str = "No results found";

impl SearchResponse {
    /// Build from scraped hits. Zero hits is a failure with [`NO_RESULTS`].
    #[must_use]
    pub fn from_hits(
        query: impl Into<String>,
        engine: SearchEngine,
        results: Vec<SearchHit>,
        search_time_ms: u64,
        backend: BackendKind,
    ) -> Self {
        let success = !results.is_empty();
        Self {
            success,
            query: query.into(),
            engine,
            metadata: SearchMetadata {
                search_time_ms,
                result_count: Some(results.len()),
                backend: Some(backend),
            },
            results,
            error: (!success).then(|| NO_RESULTS.to_string()),
        }
    }

    #[must_use]
    pub fn failed(
        query: impl Into<String>,
        engine: SearchEngine,
        error: &FetchError,
        search_time_ms: u64,
    ) -> Self {
        Self {
            success: false,
            query: query.into(),
            engine,
            results: Vec::new(),
            metadata: SearchMetadata {
                search_time_ms,
                ..SearchMetadata::default()
            },
            error: Some(error.summary()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchMetadata, FetchResult, SearchHit, SearchResponse};
    use crate::error::{ErrorCode, FetchError};
    use crate::kinds::{BackendKind, SearchEngine};
    use serde_json::json;

    #[test]
    fn failed_fetch_keeps_every_top_level_key() {
        let err = FetchError::from_code(ErrorCode::Navigation, "net::ERR_NAME_NOT_RESOLVED");
        let result = FetchResult::failed("https://nope.invalid", &err, 42);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            json!({
                "success": false,
                "url": "https://nope.invalid",
                "final_url": null,
                "title": null,
                "content": null,
                "metadata": { "fetch_time_ms": 42 },
                "error": "Navigation: net::ERR_NAME_NOT_RESOLVED",
            })
        );
    }

    #[test]
    fn successful_fetch_reports_lengths_and_backend() {
        let result = FetchResult::succeeded(
            "https://example.com",
            "https://example.com/".to_string(),
            Some("Example".to_string()),
            "# Example".to_string(),
            FetchMetadata {
                fetch_time_ms: 7,
                content_length: Some(9),
                html_length: Some(120),
                backend: Some(BackendKind::Http),
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["metadata"]["backend"], "http");
        assert_eq!(value["metadata"]["content_length"], 9);
        assert_eq!(value["error"], serde_json::Value::Null);
    }

    #[test]
    fn empty_search_is_a_failure() {
        let response = SearchResponse::from_hits(
            "rust",
            SearchEngine::DuckDuckGo,
            Vec::new(),
            3,
            BackendKind::Chromium,
        );
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No results found"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["engine"], "duckduckgo");
        assert_eq!(value["metadata"]["result_count"], 0);
    }

    #[test]
    fn search_hits_serialize_in_order() {
        let hit = SearchHit {
            title: "The Rust Book".to_string(),
            url: "https://doc.rust-lang.org/book/".to_string(),
            snippet: "Learn Rust".to_string(),
        };
        let response =
            SearchResponse::from_hits("rust", SearchEngine::Bing, vec![hit], 5, BackendKind::Http);
        assert!(response.success);
        assert!(response.error.is_none());
        let text = serde_json::to_string(&response.results[0]).unwrap();
        assert_eq!(
            text,
            r#"{"title":"The Rust Book","url":"https://doc.rust-lang.org/book/","snippet":"Learn Rust"}"#
        );
    }
}
