//! Debounced, cancellable, cached loader for remote paginated search results.
//!
//! The [`loader`] module holds the public surface consumed by UI code; the
//! `pager` binary wires it to a settings file for command-line use.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod loader;
pub(crate) mod util;

pub use domain::{LoaderState, PageRequest, PageResult};
pub use loader::{
    FetchOutcome, JsonFieldMapper, LoaderError, LoaderOptions, LoaderSettings, PageSource,
    PendingFetch, RawResponse, RemoteLoader, ResponseMapper, Target, map_async, map_fn,
    source_fn,
};
