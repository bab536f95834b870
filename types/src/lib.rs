//! Core domain types for pagefetch.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the conversion
//! pipeline, the fetch backends, configuration, and the CLI.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`kinds`] | Closed enums naming backends, search engines and renderers |
//! | [`error`] | [`FetchError`] with stable [`ErrorCode`] categories |
//! | [`report`] | JSON result shapes printed by the CLI |

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

pub mod error;
pub mod kinds;
pub mod report;

pub use error::{ErrorCode, FetchError, Retryability};
pub use kinds::{BackendKind, RendererKind, SearchEngine, UnknownVariant};
pub use report::{
    FetchMetadata, FetchResult, NO_RESULTS, SearchHit, SearchMetadata, SearchResponse,
};
