//! Closed sets of named choices.
//!
//! Each enum round-trips through its lowercase name so the same spelling works
//! in `config.toml`, on the command line, and in JSON output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value} (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Browser automation backend used to obtain page HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Headless Chromium driven over the DevTools protocol. Executes JavaScript.
    #[default]
    Chromium,
    /// Plain HTTP GET. No JavaScript, no browser process.
    Http,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Chromium, BackendKind::Http];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Chromium => "chromium",
            BackendKind::Http => "http",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BackendKind::Chromium),
            "http" => Ok(BackendKind::Http),
            _ => Err(UnknownVariant {
                kind: "backend",
                value: s.to_string(),
                expected: "chromium, http",
            }),
        }
    }
}

/// Search engine whose result page is scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngine {
    Google,
    #[default]
    Bing,
    #[serde(rename = "duckduckgo")]
    DuckDuckGo,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 3] = [
        SearchEngine::Google,
        SearchEngine::Bing,
        SearchEngine::DuckDuckGo,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::Bing => "bing",
            SearchEngine::DuckDuckGo => "duckduckgo",
        }
    }

    /// Result page endpoint; the query is appended as the `q` parameter.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            SearchEngine::Google => "https://www.google.com/search",
            SearchEngine::Bing => "https://www.bing.com/search",
            SearchEngine::DuckDuckGo => "https://duckduckgo.com/",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchEngine {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(SearchEngine::Google),
            "bing" => Ok(SearchEngine::Bing),
            "duckduckgo" | "ddg" => Ok(SearchEngine::DuckDuckGo),
            _ => Err(UnknownVariant {
                kind: "search engine",
                value: s.to_string(),
                expected: "google, bing, duckduckgo",
            }),
        }
    }
}

/// Which markdown renderer implementation converts the content container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Recursive renderer that walks the element tree.
    #[default]
    Structured,
    /// Single-pass renderer driven by a flat open/close event stream.
    Flat,
}

impl RendererKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RendererKind::Structured => "structured",
            RendererKind::Flat => "flat",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(RendererKind::Structured),
            "flat" => Ok(RendererKind::Flat),
            _ => Err(UnknownVariant {
                kind: "renderer",
                value: s.to_string(),
                expected: "structured, flat",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, RendererKind, SearchEngine};

    #[test]
    fn names_round_trip() {
        for backend in BackendKind::ALL {
            assert_eq!(backend.as_str().parse::<BackendKind>(), Ok(backend));
        }
        for engine in SearchEngine::ALL {
            assert_eq!(engine.to_string().parse::<SearchEngine>(), Ok(engine));
        }
        assert_eq!("flat".parse::<RendererKind>(), Ok(RendererKind::Flat));
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(" HTTP ".parse::<BackendKind>(), Ok(BackendKind::Http));
        assert_eq!("DuckDuckGo".parse::<SearchEngine>(), Ok(SearchEngine::DuckDuckGo));
    }

    #[test]
    fn unknown_names_list_the_choices() {
        let err = "selenium".parse::<BackendKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown backend: selenium (expected one of: chromium, http)"
        );
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&SearchEngine::DuckDuckGo).unwrap(),
            "\"duckduckgo\""
        );
        assert_eq!(
            serde_json::from_str::<BackendKind>("\"http\"").unwrap(),
            BackendKind::Http
        );
    }
}
