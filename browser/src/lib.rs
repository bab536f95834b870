//! Page fetching and web search for pagefetch.
//!
//! A [`Backend`] obtains raw HTML for a URL, either by driving a real Chromium
//! over the DevTools protocol or with a plain HTTP GET. [`fetch_page`] runs that
//! HTML through the conversion pipeline; [`search`] scrapes a search engine's
//! result page instead.
//!
//! Both entry points always return a result document. Failures are reported in
//! its `error` field, never as `Err`.
//!
//! # Module Structure
//!
//! - `backend` - [`PageFetcher`] capability, [`Backend`] enum, request/response types
//! - `chromium` - Headless/headed Chromium via chromiumoxide
//! - `http` - reqwest-based fetcher (no JavaScript)
//! - `page` - Fetch → extract → render → truncate
//! - `search` - Search URL construction and per-engine result scraping

mod backend;
mod chromium;
mod http;
mod page;
mod search;

pub use backend::{Backend, PageFetcher, PageRequest, RawPage};
pub use chromium::{ChromiumFetcher, find_chromium};
pub use http::HttpFetcher;
pub use page::fetch_page;
pub use search::{SearchRequest, scrape_results, search};
