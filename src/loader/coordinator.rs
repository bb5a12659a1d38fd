//! Request coordinator.
//!
//! Owns the cancellation handles of in-flight network operations and counts
//! operations that have not completed yet.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use tracing::debug;

use super::error::LoaderError;

/// Handle for one network operation. Wrap the transport future with
/// [`CancellationToken::guard`] so cancelling aborts the pending I/O.
#[derive(Debug)]
pub struct CancellationToken {
    id: u64,
    registration: Option<AbortRegistration>,
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Drive `operation` until it completes or the token is cancelled.
    pub fn guard<F, R>(
        &mut self,
        operation: F,
    ) -> impl Future<Output = Result<R, LoaderError>> + use<F, R>
    where
        F: Future<Output = Result<R, LoaderError>>,
    {
        let registration = self.registration.take();
        async move {
            match registration {
                Some(registration) => Abortable::new(operation, registration)
                    .await
                    .unwrap_or(Err(LoaderError::Cancelled)),
                None => operation.await,
            }
        }
    }
}

#[derive(Debug)]
struct ActiveOperation {
    id: u64,
    handle: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl ActiveOperation {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
        debug!(operation_id = self.id, "Cancelled in-flight operation");
    }
}

/// Tracks in-flight operations so a newer request can supersede them and
/// teardown can abort them.
///
/// With `abortable` set at most one operation is active at a time. Without
/// it operations overlap and are only ever aborted by [`cancel_all`].
///
/// [`cancel_all`]: RequestCoordinator::cancel_all
#[derive(Debug)]
pub struct RequestCoordinator {
    abortable: bool,
    next_id: u64,
    active: Vec<ActiveOperation>,
    outstanding: usize,
}

impl RequestCoordinator {
    pub fn new(abortable: bool) -> Self {
        Self {
            abortable,
            next_id: 0,
            active: Vec::new(),
            outstanding: 0,
        }
    }

    /// Start a new operation, first cancelling the previous one when
    /// cancellation is enabled.
    pub fn begin(&mut self) -> CancellationToken {
        self.next_id += 1;
        self.outstanding += 1;
        let id = self.next_id;

        if self.abortable {
            self.cancel_all();
        }

        let (handle, registration) = AbortHandle::new_pair();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active.push(ActiveOperation {
            id,
            handle,
            cancelled: Arc::clone(&cancelled),
        });
        CancellationToken {
            id,
            registration: Some(registration),
            cancelled,
        }
    }

    /// Cancel every active operation. Returns how many were active.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.active.len();
        for active in self.active.drain(..) {
            active.cancel();
        }
        count
    }

    /// Record that the operation behind `token` settled, in any way.
    pub fn finish(&mut self, token: &CancellationToken) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.active.retain(|active| active.id != token.id);
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}
