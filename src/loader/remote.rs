//! The loader facade consumed by UI code.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures::FutureExt;
use metrics::{counter, histogram};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::domain::{LoaderState, PageRequest, PageResult};
use crate::util::lock::mutex_lock;

use super::coordinator::{CancellationToken, RequestCoordinator};
use super::debounce::DebounceGate;
use super::error::LoaderError;
use super::mapping::ResponseMapper;
use super::options::{ErrorHook, LoaderOptions};
use super::outcome::{FetchOutcome, PendingFetch};
use super::resolver::ResponseResolver;
use super::state::StateTracker;

const SOURCE: &str = "loader::remote";

pub(crate) const METRIC_CACHE_HIT: &str = "pager_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "pager_cache_miss_total";
pub(crate) const METRIC_FETCH_STARTED: &str = "pager_fetch_started_total";
pub(crate) const METRIC_FETCH_CANCELLED: &str = "pager_fetch_cancelled_total";
pub(crate) const METRIC_FETCH_FAILED: &str = "pager_fetch_failed_total";
pub(crate) const METRIC_FETCH_MS: &str = "pager_fetch_ms";

struct LoaderCore<T> {
    cache: CacheStore<T>,
    tracker: StateTracker,
    coordinator: RequestCoordinator,
}

struct Shared<T> {
    resolver: ResponseResolver,
    mapper: Arc<dyn ResponseMapper<T>>,
    on_error: Option<ErrorHook>,
    page_size: u32,
    core: Mutex<LoaderCore<T>>,
}

/// Debounced, cancellable, cached loader for one paginated remote collection.
///
/// Owns all of its state; dropping it tears everything down like
/// [`destroy`](Self::destroy). Fetching must happen inside a tokio runtime.
pub struct RemoteLoader<T> {
    shared: Arc<Shared<T>>,
    gate: DebounceGate,
    initial_page: u32,
    auto_load_initial: bool,
    threshold: f64,
}

impl<T> RemoteLoader<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(options: LoaderOptions<T>) -> Self {
        let LoaderOptions {
            target,
            mapper,
            page_size,
            initial_page,
            debounce,
            cache_pages,
            auto_load_initial,
            abortable,
            threshold,
            on_error,
            client,
        } = options;

        let core = LoaderCore {
            cache: CacheStore::new(cache_pages),
            tracker: StateTracker::new(initial_page),
            coordinator: RequestCoordinator::new(abortable),
        };
        let shared = Shared {
            resolver: ResponseResolver::new(target, client.unwrap_or_default()),
            mapper,
            on_error,
            page_size,
            core: Mutex::new(core),
        };

        Self {
            shared: Arc::new(shared),
            gate: DebounceGate::new(debounce),
            initial_page,
            auto_load_initial,
            threshold,
        }
    }

    /// Request `page` of `query`.
    ///
    /// With `immediate` (or a zero debounce) the cache lookup, cancellation of
    /// the previous request and the start of the new one all happen before
    /// this returns. Otherwise the request waits out the debounce window and
    /// is dropped if another `fetch` arrives first.
    pub fn fetch(&self, query: impl Into<String>, page: u32, immediate: bool) -> PendingFetch<T> {
        let query = query.into();
        let (sender, pending) = PendingFetch::channel();
        let shared = Arc::clone(&self.shared);
        debug!(query = %query, page, immediate, "Fetch requested");
        self.gate
            .schedule(immediate, move || Shared::execute(&shared, query, page, sender));
        pending
    }

    pub fn has_cached_page(&self, query: &str, page: u32) -> bool {
        self.shared.lock_core("has_cached_page").cache.has(query, page)
    }

    pub fn state(&self) -> LoaderState {
        let core = self.shared.lock_core("state");
        let cached_pages = core.cache.cached_pages_for(core.tracker.query());
        core.tracker.snapshot(cached_pages)
    }

    pub fn clear_cache(&self) {
        self.shared.lock_core("clear_cache").cache.clear();
        debug!("Cleared page cache");
    }

    /// True only while a network operation is outstanding, never during a
    /// debounce wait or for a cache hit.
    pub fn is_loading(&self) -> bool {
        self.shared.lock_core("is_loading").coordinator.is_loading()
    }

    pub fn current_query(&self) -> String {
        self.shared.lock_core("current_query").tracker.query().to_string()
    }

    pub fn current_page(&self) -> u32 {
        self.shared.lock_core("current_page").tracker.current_page()
    }

    pub fn total_pages(&self) -> u32 {
        self.shared.lock_core("total_pages").tracker.total_pages()
    }
}

impl<T> RemoteLoader<T> {
    /// Cancel the pending timer, abort every in-flight request and drop all
    /// cached pages. Superseded calls resolve as [`FetchOutcome::Cancelled`].
    ///
    /// In-flight requests are aborted even when supersession is disabled.
    pub fn destroy(&self) {
        let timer_cancelled = self.gate.cancel();
        let mut core = self.shared.lock_core("destroy");
        let requests_cancelled = core.coordinator.cancel_all();
        core.cache.clear();
        drop(core);
        debug!(timer_cancelled, requests_cancelled, "Loader destroyed");
    }

    pub fn page_size(&self) -> u32 {
        self.shared.page_size
    }

    pub fn initial_page(&self) -> u32 {
        self.initial_page
    }

    /// Whether the caller should load `initial_page` on mount.
    pub fn auto_load_initial(&self) -> bool {
        self.auto_load_initial
    }

    /// Scroll-sentinel threshold for the caller.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<T> Drop for RemoteLoader<T> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T> Shared<T> {
    fn lock_core(&self, op: &'static str) -> MutexGuard<'_, LoaderCore<T>> {
        mutex_lock(&self.core, SOURCE, op)
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + 'static,
{
    fn execute(
        this: &Arc<Self>,
        query: String,
        page: u32,
        sender: oneshot::Sender<FetchOutcome<T>>,
    ) {
        let mut core = this.lock_core("execute");
        if let Some(cached) = core.cache.get(&query, page) {
            let result = PageResult::new(cached.items.clone(), page, cached.total_pages);
            drop(core);
            counter!(METRIC_CACHE_HIT).increment(1);
            debug!(query = %query, page, "Served page from cache");
            let _ = sender.send(FetchOutcome::Loaded(result));
            return;
        }

        let token = core.coordinator.begin();
        drop(core);
        counter!(METRIC_CACHE_MISS).increment(1);
        counter!(METRIC_FETCH_STARTED).increment(1);
        debug!(query = %query, page, operation_id = token.id(), "Starting network fetch");

        let request = PageRequest::new(query, page, this.page_size);
        let shared = Arc::clone(this);
        tokio::spawn(async move {
            let outcome = shared.run(&request, token).await;
            let _ = sender.send(outcome);
        });
    }

    async fn run(&self, request: &PageRequest, mut token: CancellationToken) -> FetchOutcome<T> {
        let started_at = Instant::now();
        let result = token
            .guard(async {
                let raw = AssertUnwindSafe(self.resolver.resolve(request))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(LoaderError::network(panic_message("page source", &*panic)))
                    })?;
                AssertUnwindSafe(self.mapper.map(raw))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(LoaderError::mapping(panic_message("response mapper", &*panic)))
                    })
            })
            .await;
        histogram!(METRIC_FETCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        self.complete(request, &token, result)
    }

    fn complete(
        &self,
        request: &PageRequest,
        token: &CancellationToken,
        result: Result<PageResult<T>, LoaderError>,
    ) -> FetchOutcome<T> {
        let mut core = self.lock_core("complete");
        core.coordinator.finish(token);

        // A successor may have cancelled us after the transport finished.
        let result = if token.is_cancelled() {
            Err(LoaderError::Cancelled)
        } else {
            result
        };

        match result {
            Ok(page) => {
                core.cache.put(
                    &request.query,
                    request.page,
                    page.items.clone(),
                    page.total_pages,
                );
                core.tracker
                    .record(&request.query, request.page, page.total_pages);
                drop(core);
                info!(
                    query = %request.query,
                    page = request.page,
                    items = page.items.len(),
                    total_pages = page.total_pages,
                    "Page loaded"
                );
                FetchOutcome::Loaded(page)
            }
            Err(err) if err.is_cancellation() => {
                drop(core);
                counter!(METRIC_FETCH_CANCELLED).increment(1);
                debug!(
                    query = %request.query,
                    page = request.page,
                    operation_id = token.id(),
                    "Fetch superseded"
                );
                FetchOutcome::Cancelled
            }
            Err(err) => {
                drop(core);
                counter!(METRIC_FETCH_FAILED, "kind" => err.kind().as_str()).increment(1);
                warn!(
                    query = %request.query,
                    page = request.page,
                    error = %err,
                    "Fetch failed"
                );
                if let Some(hook) = &self.on_error {
                    hook(&err);
                }
                FetchOutcome::Failed(err)
            }
        }
    }
}

fn panic_message(stage: &str, panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    format!("{stage} panicked: {detail}")
}
