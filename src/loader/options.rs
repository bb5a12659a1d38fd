//! Loader configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::error::LoaderError;
use super::mapping::ResponseMapper;
use super::resolver::Target;

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_INITIAL_PAGE: u32 = 1;
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_CACHE_PAGES: usize = 10;
const DEFAULT_THRESHOLD: f64 = 0.8;

/// Hook invoked once per surfaced (non-cancellation) error.
pub type ErrorHook = Arc<dyn Fn(&LoaderError) + Send + Sync>;

/// Plain-data loader settings, deserializable from the `[loader]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    pub page_size: u32,
    pub initial_page: u32,
    pub debounce_ms: u64,
    pub cache_pages: usize,
    pub auto_load_initial: bool,
    pub abortable: bool,
    pub threshold: f64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            initial_page: DEFAULT_INITIAL_PAGE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cache_pages: DEFAULT_CACHE_PAGES,
            auto_load_initial: true,
            abortable: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Everything a [`RemoteLoader`](super::RemoteLoader) needs.
pub struct LoaderOptions<T> {
    pub target: Target,
    pub mapper: Arc<dyn ResponseMapper<T>>,
    pub page_size: u32,
    pub initial_page: u32,
    /// `Duration::ZERO` makes every fetch immediate.
    pub debounce: Duration,
    pub cache_pages: usize,
    /// Advisory for the caller; the loader never loads on its own.
    pub auto_load_initial: bool,
    pub abortable: bool,
    /// Advisory scroll-sentinel threshold for the caller.
    pub threshold: f64,
    pub on_error: Option<ErrorHook>,
    /// Client used for template targets. A default client is built when unset.
    pub client: Option<reqwest::Client>,
}

impl<T: Send> LoaderOptions<T> {
    pub fn new(target: Target, mapper: impl ResponseMapper<T> + 'static) -> Self {
        Self::from_settings(target, mapper, &LoaderSettings::default())
    }

    pub fn from_settings(
        target: Target,
        mapper: impl ResponseMapper<T> + 'static,
        settings: &LoaderSettings,
    ) -> Self {
        Self {
            target,
            mapper: Arc::new(mapper),
            page_size: settings.page_size,
            initial_page: settings.initial_page,
            debounce: Duration::from_millis(settings.debounce_ms),
            cache_pages: settings.cache_pages,
            auto_load_initial: settings.auto_load_initial,
            abortable: settings.abortable,
            threshold: settings.threshold,
            on_error: None,
            client: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_initial_page(mut self, initial_page: u32) -> Self {
        self.initial_page = initial_page;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_cache_pages(mut self, cache_pages: usize) -> Self {
        self.cache_pages = cache_pages;
        self
    }

    pub fn with_auto_load_initial(mut self, auto_load_initial: bool) -> Self {
        self.auto_load_initial = auto_load_initial;
        self
    }

    pub fn with_abortable(mut self, abortable: bool) -> Self {
        self.abortable = abortable;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }
}

impl<T> fmt::Debug for LoaderOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("target", &self.target)
            .field("page_size", &self.page_size)
            .field("initial_page", &self.initial_page)
            .field("debounce", &self.debounce)
            .field("cache_pages", &self.cache_pages)
            .field("auto_load_initial", &self.auto_load_initial)
            .field("abortable", &self.abortable)
            .field("threshold", &self.threshold)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
