//! pagefetch - fetch a web page or a search result list as JSON.
//!
//! ```text
//! pagefetch fetch --url https://example.com/post [--backend http] [--max-length 20000]
//! pagefetch search --query "rust async runtimes" [--engine google] [--max-results 5]
//! ```
//!
//! # Output
//!
//! stdout carries exactly one pretty-printed JSON document: a `FetchResult` for
//! `fetch`, a `SearchResponse` for `search`. Logs go to stderr, filtered by
//! `RUST_LOG` (default `warn`).
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | `success` is true |
//! | 1 | The fetch or search failed; details in `error` |
//! | 2 | Usage or configuration error; nothing printed on stdout |
//!
//! # Settings precedence
//!
//! Command-line flags, then the config file, then built-in defaults.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pagefetch_browser::{Backend, PageRequest, SearchRequest, fetch_page, search};
use pagefetch_config::{FetchSettings, PageFetchConfig, Settings};
use pagefetch_types::{BackendKind, FetchResult, RendererKind, SearchEngine, SearchResponse};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "pagefetch", version)]
#[command(about = "Fetch web pages or search results as LLM-ready Markdown and JSON")]
struct Cli {
    /// Config file (default: $PAGEFETCH_CONFIG or ~/.pagefetch/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a page and print its main content as Markdown
    Fetch(FetchArgs),
    /// Search the web and print the scraped results
    Search(SearchArgs),
}

/// Flags shared by both subcommands.
#[derive(Debug, Args)]
struct BrowserArgs {
    /// Page loader: chromium or http
    #[arg(long, value_name = "BACKEND")]
    backend: Option<BackendKind>,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headed")]
    headless: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Page load timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// URL to fetch (http or https)
    #[arg(long)]
    url: String,

    #[command(flatten)]
    browser: BrowserArgs,

    /// Seconds to let client-side scripts settle after load
    #[arg(long, value_name = "SECONDS")]
    wait: Option<f64>,

    /// Maximum content length in characters
    #[arg(long, value_name = "CHARS")]
    max_length: Option<usize>,

    /// Markdown renderer: structured or flat
    #[arg(long)]
    renderer: Option<RendererKind>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Search query
    #[arg(long)]
    query: String,

    /// Search engine: google, bing or duckduckgo
    #[arg(long)]
    engine: Option<SearchEngine>,

    /// Maximum number of results
    #[arg(long, value_name = "N")]
    max_results: Option<usize>,

    #[command(flatten)]
    browser: BrowserArgs,
}

impl BrowserArgs {
    fn headless(&self) -> Option<bool> {
        match (self.headless, self.headed) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }

    fn apply(&self, fetch: &mut FetchSettings) {
        if let Some(headless) = self.headless() {
            fetch.headless = headless;
        }
        if let Some(timeout) = self.timeout {
            fetch.timeout = Duration::from_secs(timeout.max(1));
        }
    }
}

impl FetchArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(backend) = self.browser.backend {
            settings.fetch.backend = backend;
        }
        self.browser.apply(&mut settings.fetch);
        if let Some(wait) = self.wait
            && let Ok(wait) = Duration::try_from_secs_f64(wait.max(0.0))
        {
            settings.fetch.wait = wait;
        }
        if let Some(max_length) = self.max_length {
            settings.fetch.max_length = max_length;
        }
        if let Some(renderer) = self.renderer {
            settings.fetch.renderer = renderer;
        }
    }
}

impl SearchArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(backend) = self.browser.backend {
            settings.search.backend = backend;
        }
        self.browser.apply(&mut settings.fetch);
        if let Some(engine) = self.engine {
            settings.search.engine = engine;
        }
        if let Some(max_results) = self.max_results {
            settings.search.max_results = max_results.max(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let config = match explicit {
        Some(path) => Some(PageFetchConfig::load_from(path)?),
        None => PageFetchConfig::load()?,
    };
    Ok(config
        .map(|config| Settings::resolve(&config))
        .unwrap_or_default())
}

async fn run_fetch(url: &str, settings: &Settings) -> FetchResult {
    let request = PageRequest::with_settings(url, &settings.fetch);
    match Backend::new(settings.fetch.backend, &settings.browser) {
        Ok(backend) => {
            fetch_page(
                &backend,
                &request,
                settings.fetch.max_length,
                settings.fetch.renderer,
            )
            .await
        }
        Err(err) => FetchResult::failed(url, &err, 0),
    }
}

async fn run_search(query: &str, settings: &Settings) -> SearchResponse {
    let request = SearchRequest::new(query, &settings.search, &settings.fetch);
    match Backend::new(settings.search.backend, &settings.browser) {
        Ok(backend) => search(&backend, &request).await,
        Err(err) => SearchResponse::failed(query, request.engine, &err, 0),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

async fn execute(command: Command, mut settings: Settings) -> Result<bool> {
    match command {
        Command::Fetch(args) => {
            args.apply(&mut settings);
            let result = run_fetch(&args.url, &settings).await;
            print_json(&result)?;
            Ok(result.success)
        }
        Command::Search(args) => {
            args.apply(&mut settings);
            let response = run_search(&args.query, &settings).await;
            print_json(&response)?;
            Ok(response.success)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("pagefetch: {err:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match execute(cli.command, settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURE),
        Err(err) => {
            eprintln!("pagefetch: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_flags_override_settings() {
        let cli = parse(&[
            "pagefetch",
            "fetch",
            "--url",
            "https://example.com",
            "--backend",
            "http",
            "--headed",
            "--timeout",
            "12",
            "--wait",
            "0.5",
            "--max-length",
            "800",
            "--renderer",
            "flat",
        ]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(args.url, "https://example.com");
        assert_eq!(settings.fetch.backend, BackendKind::Http);
        assert!(!settings.fetch.headless);
        assert_eq!(settings.fetch.timeout, Duration::from_secs(12));
        assert_eq!(settings.fetch.wait, Duration::from_millis(500));
        assert_eq!(settings.fetch.max_length, 800);
        assert_eq!(settings.fetch.renderer, RendererKind::Flat);
    }

    #[test]
    fn absent_flags_keep_settings() {
        let cli = parse(&["pagefetch", "fetch", "--url", "https://example.com"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn search_flags_override_settings() {
        let cli = parse(&[
            "pagefetch",
            "search",
            "--query",
            "rust parsers",
            "--engine",
            "duckduckgo",
            "--max-results",
            "0",
            "--backend",
            "http",
            "--headless",
        ]);
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(args.query, "rust parsers");
        assert_eq!(settings.search.engine, SearchEngine::DuckDuckGo);
        assert_eq!(settings.search.max_results, 1);
        assert_eq!(settings.search.backend, BackendKind::Http);
        assert_eq!(settings.fetch.backend, BackendKind::Chromium);
        assert!(settings.fetch.headless);
    }

    #[test]
    fn usage_errors_are_rejected() {
        assert!(Cli::try_parse_from(["pagefetch", "fetch"]).is_err());
        assert!(Cli::try_parse_from(["pagefetch", "search", "--query", "q", "--engine", "altavista"]).is_err());
        assert!(
            Cli::try_parse_from([
                "pagefetch",
                "fetch",
                "--url",
                "https://example.com",
                "--headless",
                "--headed"
            ])
            .is_err()
        );
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[fetch]\nbackend = \"http\"\nmax_length = 1234\n\n[search]\nengine = \"google\"\n",
        )
        .expect("write config");

        let settings = load_settings(Some(&path)).expect("settings");
        assert_eq!(settings.fetch.backend, BackendKind::Http);
        assert_eq!(settings.fetch.max_length, 1234);
        assert_eq!(settings.search.engine, SearchEngine::Google);
        assert_eq!(settings.search.backend, BackendKind::Http);
    }

    #[test]
    fn bad_config_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\nmax_length = \"lots\"\n").expect("write config");
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));

        let missing = dir.path().join("absent.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[tokio::test]
    async fn invalid_url_reports_failure() {
        let settings = Settings {
            fetch: FetchSettings {
                backend: BackendKind::Http,
                ..FetchSettings::default()
            },
            ..Settings::default()
        };
        let result = run_fetch("notaurl", &settings).await;
        assert!(!result.success);
        assert!(
            result
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("InvalidUrl: "))
        );
    }
}
