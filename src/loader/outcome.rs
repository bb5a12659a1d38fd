use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::PageResult;

use super::error::LoaderError;

/// How a single `fetch` call settled.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Served from the network or the cache.
    Loaded(PageResult<T>),
    /// Transport or mapping failure; already reported to `on_error`.
    Failed(LoaderError),
    /// Superseded by a newer request or by teardown.
    Cancelled,
}

impl<T> FetchOutcome<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn loaded(&self) -> Option<&PageResult<T>> {
        match self {
            Self::Loaded(result) => Some(result),
            _ => None,
        }
    }

    /// `Ok(None)` for a cancelled call.
    pub fn into_result(self) -> Result<Option<PageResult<T>>, LoaderError> {
        match self {
            Self::Loaded(result) => Ok(Some(result)),
            Self::Failed(err) => Err(err),
            Self::Cancelled => Ok(None),
        }
    }
}

/// Future returned by [`RemoteLoader::fetch`](super::RemoteLoader::fetch).
///
/// Resolves exactly once. Dropping it does not cancel the underlying work.
#[must_use = "a pending fetch does nothing observable unless awaited"]
#[derive(Debug)]
pub struct PendingFetch<T> {
    receiver: oneshot::Receiver<FetchOutcome<T>>,
}

impl<T> PendingFetch<T> {
    pub(crate) fn channel() -> (oneshot::Sender<FetchOutcome<T>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }
}

impl<T> Future for PendingFetch<T> {
    type Output = FetchOutcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the scheduled work was discarded unexecuted.
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(FetchOutcome::Cancelled))
    }
}
