//! Fetch-layer errors.
//!
//! The conversion pipeline never fails; every [`FetchError`] originates in a
//! backend (browser launch, navigation, network) and is eventually flattened into
//! the `error` field of a result as `"<Category>: <message>"`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fetch error with a stable category.
///
/// - `code`: Stable error code
/// - `message`: Human-readable description
/// - `retryability`: Whether retry may succeed
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    /// Stable error code.
    pub code: ErrorCode,

    /// Human-readable description.
    pub message: String,

    /// Whether retry may succeed.
    pub retryability: Retryability,
}

impl FetchError {
    pub fn new(code: ErrorCode, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code,
            message: message.into(),
            retryability: Retryability::from_bool(retryable),
        }
    }

    /// Construct with the code's default retryability.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryability: code.default_retryability(),
        }
    }

    /// One-line `"<Category>: <message>"` form used in result JSON.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}: {}", self.code.category(), self.message)
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.retryability, Retryability::Retryable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retryability {
    Retryable,
    NotRetryable,
}

impl Retryability {
    #[must_use]
    pub const fn from_bool(retryable: bool) -> Self {
        if retryable {
            Self::Retryable
        } else {
            Self::NotRetryable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// URL parsing failed or scheme is not fetchable.
    InvalidUrl,
    /// No usable browser executable.
    BrowserUnavailable,
    /// Browser process could not be started or configured.
    BrowserLaunch,
    /// Page navigation or DOM access failed.
    Navigation,
    /// Page load exceeded the timeout.
    Timeout,
    /// Network/connection error (DNS, connect, TLS, body read).
    Network,
    /// HTTP 4xx client error.
    Http4xx,
    /// HTTP 5xx server error.
    Http5xx,
    /// Response could not be turned into a document.
    Extraction,
    /// Unexpected internal error.
    Internal,
}

impl ErrorCode {
    /// CamelCase label used as the category prefix in [`FetchError::summary`].
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "InvalidUrl",
            ErrorCode::BrowserUnavailable => "BrowserUnavailable",
            ErrorCode::BrowserLaunch => "BrowserLaunch",
            ErrorCode::Navigation => "Navigation",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::Network => "Network",
            ErrorCode::Http4xx => "Http4xx",
            ErrorCode::Http5xx => "Http5xx",
            ErrorCode::Extraction => "Extraction",
            ErrorCode::Internal => "Internal",
        }
    }

    #[must_use]
    pub const fn default_retryability(self) -> Retryability {
        match self {
            ErrorCode::Timeout
            | ErrorCode::Network
            | ErrorCode::Http5xx
            | ErrorCode::Navigation
            | ErrorCode::Internal => Retryability::Retryable,
            ErrorCode::InvalidUrl
            | ErrorCode::BrowserUnavailable
            | ErrorCode::BrowserLaunch
            | ErrorCode::Http4xx
            | ErrorCode::Extraction => Retryability::NotRetryable,
        }
    }
}
