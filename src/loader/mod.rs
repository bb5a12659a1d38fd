//! Remote paginated-data loader.
//!
//! Turns a rapid stream of search/page requests into a controlled sequence of
//! network calls:
//!
//! - **Debounce gate**: bursts collapse into the last request of the burst
//! - **Cache store**: previously fetched pages short-circuit the network
//! - **Request coordinator**: a new request aborts the one still in flight
//! - **Response resolver**: URL template or caller-supplied source, then a
//!   mapper that normalizes the payload
//! - **State tracker**: the last network-confirmed query, page and page count
//!
//! ```ignore
//! let loader = RemoteLoader::new(
//!     LoaderOptions::new(
//!         Target::template("https://api.example.com/items?q={query}&page={page}&size={pageSize}"),
//!         JsonFieldMapper::default(),
//!     )
//!     .with_on_error(|err| tracing::warn!(error = %err, "search failed")),
//! );
//!
//! match loader.fetch("rust", 1, false).await {
//!     FetchOutcome::Loaded(page) => render(page.items),
//!     FetchOutcome::Failed(_) => show_error(),
//!     FetchOutcome::Cancelled => {}
//! }
//! ```

mod coordinator;
mod debounce;
mod error;
mod mapping;
mod options;
mod outcome;
mod remote;
mod resolver;
mod state;

pub use coordinator::{CancellationToken, RequestCoordinator};
pub use debounce::DebounceGate;
pub use error::{ErrorKind, LoaderError};
pub use mapping::{AsyncFnMapper, FnMapper, JsonFieldMapper, ResponseMapper, map_async, map_fn};
pub use options::{ErrorHook, LoaderOptions, LoaderSettings};
pub use outcome::{FetchOutcome, PendingFetch};
pub use remote::RemoteLoader;
pub use resolver::{
    FnSource, PageSource, RawResponse, ResponseResolver, Target, encode_component,
    expand_template, source_fn,
};
pub use state::StateTracker;

pub(crate) use remote::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_FETCH_CANCELLED, METRIC_FETCH_FAILED,
    METRIC_FETCH_MS, METRIC_FETCH_STARTED,
};
