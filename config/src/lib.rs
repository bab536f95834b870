//! pagefetch configuration.
//!
//! `~/.pagefetch/config.toml` (or the file named by `PAGEFETCH_CONFIG`) is read
//! into [`PageFetchConfig`], whose fields are all optional. [`Settings::resolve`]
//! turns that into concrete values once, at the boundary, so the fetch layer
//! never handles a missing setting.
//!
//! ```toml
//! [fetch]
//! backend = "chromium"
//! timeout_seconds = 30
//! wait_seconds = 2.0
//! max_length = 50000
//! headless = true
//! renderer = "structured"
//!
//! [search]
//! engine = "bing"
//! max_results = 10
//!
//! [browser]
//! chromium_path = "${HOME}/.local/bin/chromium"
//! window_width = 1920
//! window_height = 1080
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use pagefetch_types::{BackendKind, RendererKind, SearchEngine};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_WAIT_SECONDS: f64 = 2.0;
pub const DEFAULT_MAX_LENGTH: usize = 50_000;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1080;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Overrides the config file location.
pub const ENV_CONFIG_PATH: &str = "PAGEFETCH_CONFIG";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFetchConfig {
    pub fetch: Option<FetchConfig>,
    pub search: Option<SearchConfig>,
    pub browser: Option<BrowserConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    pub backend: Option<BackendKind>,
    pub timeout_seconds: Option<u64>,
    /// Seconds to let page scripts run after load.
    pub wait_seconds: Option<f64>,
    /// Content bound in characters, before the truncation marker.
    pub max_length: Option<usize>,
    pub headless: Option<bool>,
    pub renderer: Option<RendererKind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    pub engine: Option<SearchEngine>,
    /// Falls back to `[fetch] backend`.
    pub backend: Option<BackendKind>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserConfig {
    /// Chromium/Chrome executable. Searched for on PATH when unset.
    pub chromium_path: Option<String>,
    pub user_agent: Option<String>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Expand `${VAR}` references. Unset variables expand to nothing; an
/// unterminated `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl PageFetchConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load an explicitly named file; a missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }
}

/// `$PAGEFETCH_CONFIG`, else `~/.pagefetch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(ENV_CONFIG_PATH)
        && !explicit.trim().is_empty()
    {
        return Some(PathBuf::from(expand_env_vars(explicit.trim())));
    }
    dirs::home_dir().map(|home| home.join(".pagefetch").join("config.toml"))
}

/// Fully resolved configuration. No optional fields except where absence is
/// meaningful (`chromium_path`).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub search: SearchSettings,
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub backend: BackendKind,
    pub timeout: Duration,
    pub wait: Duration,
    pub max_length: usize,
    pub headless: bool,
    pub renderer: RendererKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub engine: SearchEngine,
    pub backend: BackendKind,
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub chromium_path: Option<PathBuf>,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&PageFetchConfig::default())
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Settings::default().fetch
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Settings::default().search
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Settings::default().browser
    }
}

impl Settings {
    #[must_use]
    pub fn resolve(config: &PageFetchConfig) -> Self {
        let fetch = config.fetch.as_ref();
        let search = config.search.as_ref();
        let browser = config.browser.as_ref();

        let backend = fetch.and_then(|f| f.backend).unwrap_or_default();
        let timeout_seconds = fetch
            .and_then(|f| f.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
            .max(1);
        let wait = fetch
            .and_then(|f| f.wait_seconds)
            .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_WAIT_SECONDS));

        let fetch_settings = FetchSettings {
            backend,
            timeout: Duration::from_secs(timeout_seconds),
            wait,
            max_length: fetch
                .and_then(|f| f.max_length)
                .unwrap_or(DEFAULT_MAX_LENGTH),
            headless: fetch.and_then(|f| f.headless).unwrap_or(true),
            renderer: fetch.and_then(|f| f.renderer).unwrap_or_default(),
        };

        let search_settings = SearchSettings {
            engine: search.and_then(|s| s.engine).unwrap_or_default(),
            backend: search.and_then(|s| s.backend).unwrap_or(backend),
            max_results: search
                .and_then(|s| s.max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .max(1),
        };

        let browser_settings = BrowserSettings {
            chromium_path: browser
                .and_then(|b| b.chromium_path.as_deref())
                .map(expand_env_vars)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            user_agent: browser
                .and_then(|b| b.user_agent.as_deref())
                .map(expand_env_vars)
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            window_width: browser
                .and_then(|b| b.window_width)
                .unwrap_or(DEFAULT_WINDOW_WIDTH)
                .max(1),
            window_height: browser
                .and_then(|b| b.window_height)
                .unwrap_or(DEFAULT_WINDOW_HEIGHT)
                .max(1),
        };

        Self {
            fetch: fetch_settings,
            search: search_settings,
            browser: browser_settings,
        }
    }
}
