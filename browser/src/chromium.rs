//! Chromium-driven page loading over the DevTools protocol.
//!
//! Every fetch launches a fresh browser with a throwaway profile directory,
//! injects a small script that hides the usual automation fingerprints, loads the
//! page under the request timeout, waits for late JavaScript, then reads back the
//! rendered DOM. The browser is shut down on every path out of [`ChromiumFetcher::fetch`].

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs, process};

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use futures_util::StreamExt;
use tokio::time::{sleep, timeout};

use pagefetch_config::BrowserSettings;
use pagefetch_types::{BackendKind, ErrorCode, FetchError};

use crate::backend::{PageFetcher, PageRequest, RawPage};

/// Runs before any page script.
const STEALTH_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = { runtime: {} };
";

const PROFILE_PREFIX: &str = "pagefetch-profile";

/// Loads pages in a real Chromium so client-side rendering runs.
#[derive(Debug, Clone)]
pub struct ChromiumFetcher {
    executable: Option<PathBuf>,
    user_agent: String,
    window_width: u32,
    window_height: u32,
}

impl ChromiumFetcher {
    #[must_use]
    pub fn new(settings: &BrowserSettings) -> Self {
        Self {
            executable: settings.chromium_path.clone(),
            user_agent: settings.user_agent.clone(),
            window_width: settings.window_width,
            window_height: settings.window_height,
        }
    }

    /// Whether a Chromium executable can be found for this fetcher.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.executable().is_ok()
    }

    fn executable(&self) -> Result<PathBuf, FetchError> {
        match &self.executable {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(path) => Err(FetchError::new(
                ErrorCode::BrowserUnavailable,
                format!("chromium executable not found at {}", path.display()),
                false,
            )),
            None => find_chromium().ok_or_else(|| {
                FetchError::new(
                    ErrorCode::BrowserUnavailable,
                    "chromium executable not found",
                    false,
                )
            }),
        }
    }

    fn launch_config(
        &self,
        executable: PathBuf,
        profile: &Path,
        headless: bool,
    ) -> Result<BrowserConfig, FetchError> {
        let builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(profile)
            .window_size(self.window_width, self.window_height)
            .viewport(Viewport {
                width: self.window_width,
                height: self.window_height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .args(launch_args(&self.user_agent, sandbox_unavailable()));
        let builder = if headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        builder.build().map_err(|e| {
            FetchError::new(
                ErrorCode::BrowserLaunch,
                format!("failed to configure chromium: {e}"),
                false,
            )
        })
    }
}

impl PageFetcher for ChromiumFetcher {
    fn kind(&self) -> BackendKind {
        BackendKind::Chromium
    }

    async fn fetch(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        let executable = self.executable()?;
        let profile = TempProfileDir::new()?;
        let config = self.launch_config(executable, &profile.path, request.headless)?;

        let (mut browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            FetchError::new(
                ErrorCode::BrowserLaunch,
                format!("failed to launch chromium: {e}"),
                false,
            )
        })?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::trace!("chromium handler event error: {err}");
                }
            }
        });

        let loaded = load_page(&browser, request).await;

        if let Err(err) = browser.close().await {
            tracing::warn!("Failed to close chromium: {err}");
        }
        if let Err(err) = browser.wait().await {
            tracing::warn!("Failed to reap chromium process: {err}");
        }
        handler_task.abort();

        loaded
    }
}

async fn load_page(browser: &Browser, request: &PageRequest) -> Result<RawPage, FetchError> {
    let page = browser.new_page("about:blank").await.map_err(|e| {
        FetchError::new(
            ErrorCode::BrowserLaunch,
            format!("failed to create page: {e}"),
            true,
        )
    })?;

    if let Err(err) = page
        .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
        .await
    {
        tracing::debug!("Failed to install stealth script: {err}");
    }

    match timeout(request.timeout, page.goto(request.url.as_str())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            return Err(FetchError::from_code(
                ErrorCode::Navigation,
                format!("navigation failed: {e}"),
            ));
        }
        Err(_) => {
            return Err(FetchError::from_code(
                ErrorCode::Timeout,
                format!(
                    "page load exceeded {:.1}s",
                    request.timeout.as_secs_f64()
                ),
            ));
        }
    }

    if !request.wait.is_zero() {
        sleep(request.wait).await;
    }

    let html = evaluate_string(&page, "document.documentElement.outerHTML").await?;
    let title = evaluate_string(&page, "document.title")
        .await
        .ok()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty());
    let final_url = match page.url().await {
        Ok(Some(url)) => url,
        Ok(None) | Err(_) => request.url.clone(),
    };

    if let Err(err) = page.close().await {
        tracing::debug!("Failed to close page: {err}");
    }

    Ok(RawPage {
        final_url,
        title,
        html,
    })
}

async fn evaluate_string(page: &Page, expression: &str) -> Result<String, FetchError> {
    let result = page.evaluate(expression).await.map_err(|e| {
        FetchError::from_code(
            ErrorCode::Extraction,
            format!("failed to evaluate {expression}: {e}"),
        )
    })?;
    result.into_value::<String>().map_err(|_| {
        FetchError::from_code(
            ErrorCode::Extraction,
            format!("{expression} did not return a string"),
        )
    })
}

fn launch_args(user_agent: &str, no_sandbox: bool) -> Vec<String> {
    let mut args = vec![
        format!("--user-agent={user_agent}"),
        "--lang=en-US,en".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if no_sandbox {
        args.push("--no-sandbox".to_string());
        args.push("--disable-setuid-sandbox".to_string());
    }
    args
}

/// Containers rarely grant the namespaces Chromium's sandbox needs.
fn sandbox_unavailable() -> bool {
    Path::new("/.dockerenv").exists()
        || env::var_os("container").is_some()
        || env::var_os("KUBERNETES_SERVICE_HOST").is_some()
}

struct TempProfileDir {
    path: PathBuf,
}

impl TempProfileDir {
    fn new() -> Result<Self, FetchError> {
        let base = env::temp_dir();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = process::id();

        (0..10)
            .map(|attempt| base.join(format!("{PROFILE_PREFIX}-{pid}-{timestamp}-{attempt}")))
            .find(|path| fs::create_dir(path).is_ok())
            .map(|path| Self { path })
            .ok_or_else(|| {
                FetchError::new(
                    ErrorCode::Internal,
                    "failed to create temporary browser profile directory",
                    false,
                )
            })
    }
}

impl Drop for TempProfileDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), "Failed to remove browser profile: {err}");
        }
    }
}

/// Locate a Chromium or Chrome executable: `PATH` first, then well-known
/// install locations for the current platform.
#[must_use]
pub fn find_chromium() -> Option<PathBuf> {
    if let Some(path_var) = env::var_os("PATH") {
        let on_path = env::split_paths(&path_var).find_map(|dir| {
            EXECUTABLE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        });
        if on_path.is_some() {
            return on_path;
        }
    }

    install_locations().into_iter().find(|path| path.is_file())
}

#[cfg(target_os = "windows")]
const EXECUTABLE_NAMES: &[&str] = &["chromium.exe", "chrome.exe"];

#[cfg(target_os = "macos")]
const EXECUTABLE_NAMES: &[&str] = &["chromium", "google-chrome", "chrome"];

#[cfg(all(unix, not(target_os = "macos")))]
const EXECUTABLE_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

#[cfg(target_os = "windows")]
fn install_locations() -> Vec<PathBuf> {
    const SUFFIXES: [&str; 2] = [
        "Google/Chrome/Application/chrome.exe",
        "Chromium/Application/chrome.exe",
    ];
    ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"]
        .into_iter()
        .filter_map(env::var_os)
        .map(PathBuf::from)
        .flat_map(|base| SUFFIXES.iter().map(move |suffix| base.join(suffix)))
        .collect()
}

#[cfg(target_os = "macos")]
fn install_locations() -> Vec<PathBuf> {
    [
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/opt/homebrew/bin/chromium",
        "/usr/local/bin/chromium",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn install_locations() -> Vec<PathBuf> {
    [
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/snap/bin/chromium",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}
